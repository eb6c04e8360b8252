// file: src/index/mod.rs
// description: hierarchical index module exports
// reference: internal module structure

pub mod auto_merging;
pub mod docstore;
pub mod parser;

pub use auto_merging::{AutoMergingIndex, BuildOptions, VECTOR_DIR};
pub use docstore::{DOCSTORE_FILE, DocStore, EmbeddingInfo};
pub use parser::{HierarchicalNodeParser, get_leaf_nodes, split_text};
