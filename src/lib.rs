//! # repo-catalog
//!
//! A semantic catalog of source repositories. Each repository is cloned,
//! its owners file, metadata file and documentation are read, and the
//! result is stored as a profile with two embeddings: one over the
//! profile's structured fields and one over its documentation summaries.
//! Natural-language questions are answered by searching both fields and
//! merging the hits.
//!
//! ## Architecture
//!
//! ```text
//!   supported repos (JSON)                     question + filter
//!            │                                        │
//!            ▼                                        ▼
//!   ┌──────────────────────┐               ┌──────────────────────┐
//!   │ IngestionOrchestrator│               │   RetrievalEngine    │
//!   │  semaphore-bounded   │               │  embed question      │
//!   │  one task per repo   │               └──────────┬───────────┘
//!   └──────────┬───────────┘                          │
//!              │ clone → owners → metadata            │
//!              │ → summarize docs                     ▼
//!              ▼                          ┌────────────────────────┐
//!   ┌──────────────────────┐              │ VectorStore.search     │
//!   │   ProfileBuilder     │              │  pre-filter            │
//!   │  validate + texts    │              │  general ∪ docs hits   │
//!   └──────────┬───────────┘              │  dedupe by id          │
//!              │                          │  min_score, post-filter│
//!              ▼                          │  sort desc, top k      │
//!   ┌──────────────────────┐              └────────────────────────┘
//!   │ VectorStore.upsert   │
//!   │  embed both texts    │
//!   │  replace by key      │
//!   └──────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration
//! - [`error`] - `CatalogError` taxonomy shared by every stage
//! - [`models`] - Profiles, filters, reports and request/response types
//! - [`profile`] - Profile construction, validation and canonical texts
//! - [`git`] - Shallow clones into per-run checkout directories
//! - [`llm`] - Embedding and summarization providers (Ollama or OpenAI-compatible)
//! - [`search::vector`] - Dual-field vector store with JSON persistence
//! - [`search::merge`] - Union, dedupe, threshold and rank of per-field hits
//! - [`ingest`] - Refresh pipeline with per-repository failure isolation
//! - [`retrieval`] - Ask and list-processed operations
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state wiring the above together

pub mod api;
pub mod config;
pub mod error;
pub mod git;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod profile;
pub mod retrieval;
pub mod search;
pub mod state;
