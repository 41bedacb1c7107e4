pub mod body;
pub mod candidate;
pub mod classify;
pub mod error;
pub mod frontmatter;
pub mod loader;
pub mod mcp_api;
pub mod model;
pub mod render;
pub mod sections;
pub mod taxonomy;
pub mod validator;
