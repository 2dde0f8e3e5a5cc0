use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Discriminator values accepted in a raw storage record's `type` field.
pub const STORAGE_KINDS: &[&str] = &[
    "Local",
    "Module",
    "S3",
    "GCS",
    "Azure",
    "Git",
    "GitHub",
    "GitLab",
    "Bitbucket",
    "CodeCommit",
    "Docker",
    "Webhook",
];

/// Describes where a flow's executable artifact is stored.
///
/// The fields shared by every storage type live here; the type-specific
/// location lives in [`StorageBackend`], selected by the record's `type` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageDescriptor {
    #[serde(flatten)]
    pub backend: StorageBackend,
    /// Flow name to location within the storage (a path, key or import string).
    pub flows: BTreeMap<String, String>,
    /// Names of secrets the storage needs at retrieval time.
    pub secrets: Vec<String>,
}

/// Wire shape of a storage record; `flows` and `secrets` may be absent or `null`.
#[derive(Deserialize)]
struct RawDescriptor {
    #[serde(flatten)]
    backend: StorageBackend,
    #[serde(default)]
    flows: Option<BTreeMap<String, String>>,
    #[serde(default)]
    secrets: Option<Vec<String>>,
}

impl From<RawDescriptor> for StorageDescriptor {
    fn from(raw: RawDescriptor) -> Self {
        Self {
            backend: raw.backend,
            flows: raw.flows.unwrap_or_default(),
            secrets: raw.secrets.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StorageBackend {
    Local {
        directory: String,
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        stored_as_script: bool,
    },
    Module {
        module: String,
    },
    S3 {
        bucket: String,
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        client_options: Option<Map<String, Value>>,
    },
    #[serde(rename = "GCS")]
    Gcs {
        bucket: String,
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        project: Option<String>,
    },
    Azure {
        container: String,
        #[serde(default)]
        blob_name: Option<String>,
    },
    Git {
        repo: String,
        flow_path: String,
        #[serde(default)]
        repo_host: Option<String>,
        #[serde(default)]
        branch_name: Option<String>,
        #[serde(default)]
        tag: Option<String>,
        #[serde(default)]
        commit: Option<String>,
        #[serde(default)]
        git_token_secret_name: Option<String>,
        #[serde(default)]
        use_ssh: bool,
    },
    GitHub {
        repo: String,
        path: String,
        #[serde(default, rename = "ref")]
        git_ref: Option<String>,
    },
    GitLab {
        repo: String,
        path: String,
        #[serde(default)]
        host: Option<String>,
        #[serde(default, rename = "ref")]
        git_ref: Option<String>,
    },
    Bitbucket {
        project: String,
        repo: String,
        path: String,
        #[serde(default)]
        host: Option<String>,
        #[serde(default, rename = "ref")]
        git_ref: Option<String>,
    },
    CodeCommit {
        repo: String,
        path: String,
        #[serde(default)]
        commit: Option<String>,
    },
    Docker {
        image_name: String,
        image_tag: String,
        #[serde(default)]
        registry_url: Option<String>,
    },
    Webhook {
        build_request_kwargs: Map<String, Value>,
        build_request_http_method: String,
        get_flow_request_kwargs: Map<String, Value>,
        get_flow_request_http_method: String,
    },
}

impl StorageDescriptor {
    /// Decodes a raw storage record, dispatching on its `type` discriminator.
    pub fn from_raw(raw: &Value) -> Result<Self, StorageError> {
        let kind = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or(StorageError::MissingDiscriminator)?;
        if !STORAGE_KINDS.contains(&kind) {
            return Err(StorageError::UnknownKind(kind.to_string()));
        }
        serde_json::from_value::<RawDescriptor>(raw.clone())
            .map(StorageDescriptor::from)
            .map_err(|e| StorageError::InvalidDescriptor {
                kind: kind.to_string(),
                message: e.to_string(),
            })
    }

    pub fn kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// The recorded location of `flow_name` inside this storage, if any.
    pub fn flow_location(&self, flow_name: &str) -> Option<&str> {
        self.flows.get(flow_name).map(String::as_str)
    }
}

impl StorageBackend {
    pub fn kind(&self) -> &'static str {
        match self {
            StorageBackend::Local { .. } => "Local",
            StorageBackend::Module { .. } => "Module",
            StorageBackend::S3 { .. } => "S3",
            StorageBackend::Gcs { .. } => "GCS",
            StorageBackend::Azure { .. } => "Azure",
            StorageBackend::Git { .. } => "Git",
            StorageBackend::GitHub { .. } => "GitHub",
            StorageBackend::GitLab { .. } => "GitLab",
            StorageBackend::Bitbucket { .. } => "Bitbucket",
            StorageBackend::CodeCommit { .. } => "CodeCommit",
            StorageBackend::Docker { .. } => "Docker",
            StorageBackend::Webhook { .. } => "Webhook",
        }
    }
}

impl fmt::Display for StorageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backend {
            StorageBackend::Local { directory, .. } => write!(f, "Local({})", directory),
            StorageBackend::Module { module } => write!(f, "Module({})", module),
            StorageBackend::S3 { bucket, .. } => write!(f, "S3({})", bucket),
            StorageBackend::Gcs { bucket, .. } => write!(f, "GCS({})", bucket),
            StorageBackend::Azure { container, .. } => write!(f, "Azure({})", container),
            StorageBackend::Git { repo, flow_path, .. } => write!(f, "Git({repo}:{flow_path})"),
            StorageBackend::GitHub { repo, path, .. }
            | StorageBackend::GitLab { repo, path, .. }
            | StorageBackend::CodeCommit { repo, path, .. } => {
                write!(f, "{}({}:{})", self.kind(), repo, path)
            }
            StorageBackend::Bitbucket {
                project,
                repo,
                path,
                ..
            } => write!(f, "Bitbucket({}/{}:{})", project, repo, path),
            StorageBackend::Docker {
                image_name,
                image_tag,
                ..
            } => write!(f, "Docker({}:{})", image_name, image_tag),
            StorageBackend::Webhook { .. } => write!(f, "Webhook"),
        }
    }
}
