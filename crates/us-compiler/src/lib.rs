//! Userstyle Compiler
//!
//! This crate turns a userstyle (CSS, optionally scoped with
//! `@-moz-document` blocks) into a userscript that injects the CSS with
//! `GM_addStyle` on the pages the blocks select.

pub mod builder;
pub mod condition;
pub mod emitter;
pub mod escape;
pub mod metadata;

pub use builder::{convert_userstyle, Userscript, UserscriptBuilder};
pub use condition::{expression, translate, translate_with, Translation, TranslationContext};
pub use metadata::ScriptMetadata;
