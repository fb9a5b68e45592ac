pub mod api;
pub mod ast;
pub mod cast;
pub mod error;
pub mod lexer;
mod parser;
pub mod projection;
pub mod resolver;
pub mod scene;
pub mod sequence;

pub use api::{load_scene, load_scene_with_options, parse_cast, parse_scene, LoadedScene};
pub use sequence::expand;
