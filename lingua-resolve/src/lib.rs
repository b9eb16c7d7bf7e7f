//! Lingua Resolve - Translation Node Resolution
//!
//! Given a page in a content tree and a locale, finds the node holding the
//! localized content: the page's translation folder (a child typed
//! `{page type}TranslationFolder`) and, under it, the child whose locale
//! field matches. Pages without a matching translation resolve to
//! themselves. Results are cached per page and locale and invalidated
//! through the page's children tag.
//!
//! A separate [`DictionaryTermCache`] caches term lookups against a
//! dictionary service under the same discipline.
//!
//! Every cache is built explicitly from a shared backend; nothing here is
//! global.

pub mod dictionary;
pub mod folder;
pub mod node;
pub mod resolver;

pub use dictionary::{locale_tag, DictionaryKey, DictionaryTermCache};
pub use folder::{locate_translation_folder, FolderResolver};
pub use node::NodeResolver;
pub use resolver::{ResolverStats, TranslationResolver};
