use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the catalog file and per-run checkouts live
    pub data_dir: PathBuf,
    /// Server bind address
    pub bind_addr: String,
    /// JSON array of repository URLs consumed by the refresh trigger
    pub supported_repos_path: PathBuf,
    /// LLM provider configuration
    pub llm: LlmConfig,
    /// Retrieval tuning
    pub retrieval: RetrievalConfig,
    /// Maximum repositories processed at once during a refresh
    pub max_concurrent_ingest: usize,
    /// Clone timeout in seconds
    pub clone_timeout_secs: u64,
    /// Git personal access token for cloning private repos
    pub git_token: Option<String>,
    /// Branch to check out; the remote's default branch when unset
    pub git_branch: Option<String>,
    /// Metadata file name, relative to the checkout root
    pub metadata_file: String,
    /// Owners file name, relative to the checkout root
    pub owners_file: String,
    /// Leave cloned checkouts on disk after a refresh run
    pub keep_checkouts: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "ollama" or "openai"
    pub provider: String,
    /// Base URL for the LLM API
    pub base_url: String,
    /// Model name for document summarization
    pub chat_model: String,
    /// Model name for embeddings
    pub embedding_model: String,
    /// API key (only needed for cloud providers)
    pub api_key: Option<String>,
    /// Embedding vector dimension
    pub embedding_dim: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Results scoring below this are dropped. Must lie in [0, 1].
    pub min_score: f32,
    /// Candidate pool considered per vector field before `limit` applies.
    pub num_candidates: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "127.0.0.1:9000".to_string(),
            supported_repos_path: PathBuf::from("./supported-repos.json"),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            max_concurrent_ingest: 4,
            clone_timeout_secs: 300,
            git_token: None,
            git_branch: None,
            metadata_file: "RepoInfo.json".to_string(),
            owners_file: "CODEOWNERS".to_string(),
            keep_checkouts: false,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            api_key: None,
            embedding_dim: 768,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_score: 0.6,
            num_candidates: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("REPO_CATALOG_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Ok(addr) = std::env::var("REPO_CATALOG_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(path) = std::env::var("REPO_CATALOG_SUPPORTED_REPOS") {
            config.supported_repos_path = PathBuf::from(path);
        }
        if let Ok(val) = std::env::var("REPO_CATALOG_MAX_CONCURRENT_INGEST") {
            if let Ok(v) = val.parse::<usize>() {
                // A zero-permit semaphore would stall every refresh
                config.max_concurrent_ingest = v.max(1);
            }
        }
        if let Ok(val) = std::env::var("REPO_CATALOG_CLONE_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                config.clone_timeout_secs = v;
            }
        }
        if let Ok(token) = std::env::var("REPO_CATALOG_GIT_TOKEN") {
            config.git_token = Some(token);
        }
        if let Ok(branch) = std::env::var("REPO_CATALOG_GIT_BRANCH") {
            config.git_branch = Some(branch);
        }
        if let Ok(name) = std::env::var("REPO_CATALOG_METADATA_FILE") {
            config.metadata_file = name;
        }
        if let Ok(name) = std::env::var("REPO_CATALOG_OWNERS_FILE") {
            config.owners_file = name;
        }
        if let Ok(val) = std::env::var("REPO_CATALOG_KEEP_CHECKOUTS") {
            config.keep_checkouts = matches!(val.as_str(), "1" | "true" | "yes");
        }
        if let Ok(val) = std::env::var("REPO_CATALOG_MIN_SCORE") {
            if let Ok(v) = val.parse() {
                config.retrieval.min_score = v;
            }
        }
        if let Ok(val) = std::env::var("REPO_CATALOG_NUM_CANDIDATES") {
            if let Ok(v) = val.parse() {
                config.retrieval.num_candidates = v;
            }
        }

        // LLM config
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(url) = std::env::var("LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("LLM_CHAT_MODEL") {
            config.llm.chat_model = model;
        }
        if let Ok(model) = std::env::var("LLM_EMBEDDING_MODEL") {
            config.llm.embedding_model = model;
        }
        if let Ok(key) = std::env::var("LLM_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Ok(dim) = std::env::var("LLM_EMBEDDING_DIM") {
            if let Ok(d) = dim.parse() {
                config.llm.embedding_dim = d;
            }
        }

        config
    }

    pub fn catalog_dir(&self) -> PathBuf {
        self.data_dir.join("catalog")
    }

    pub fn checkouts_dir(&self) -> PathBuf {
        self.data_dir.join("checkouts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.retrieval.min_score, 0.6);
        assert_eq!(config.retrieval.num_candidates, 100);
        assert_eq!(config.metadata_file, "RepoInfo.json");
        assert_eq!(config.owners_file, "CODEOWNERS");
        assert!(config.max_concurrent_ingest > 0);
    }

    #[test]
    fn test_derived_dirs_live_under_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/tmp/catalog-data"),
            ..Config::default()
        };
        assert_eq!(config.catalog_dir(), PathBuf::from("/tmp/catalog-data/catalog"));
        assert_eq!(config.checkouts_dir(), PathBuf::from("/tmp/catalog-data/checkouts"));
    }
}
