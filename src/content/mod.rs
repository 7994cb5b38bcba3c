//! Topic content files.
//!
//! # Layout
//!
//! ```text
//! <content_dir>/
//! └── <slug>/
//!     ├── index.mdx     # frontmatter + markdown body
//!     └── diagram.png   # assets referenced from the body
//! ```

pub mod frontmatter;
pub mod source;

pub use frontmatter::{split, Document, FrontmatterError};
pub use source::{FileSource, InlineSource, Registry, RegistryEntry, TopicSource, INDEX_FILES};
