//! Template composition and helper functions.
//!
//! Templates use MiniJinja (Jinja2 syntax). Each render unit gets a fresh
//! environment holding the configured helpers, the preload fragments and the
//! target file:
//!
//! ```jinja
//! {# lib/macros.tpl (preload) #}
//! {% macro banner(title) %}== {{ title }} =={% endmacro %}
//!
//! {# templates/readme.md.tpl (target) #}
//! {{ banner(project) }}
//! Port: {{ port | default(8080) }}
//! ```
//!
//! Top-level definitions (`macro` and `set`) from preloads are visible in
//! the target without an explicit import; any other top-level content of a
//! preload is ignored. When several sources define the same name, the last
//! one parsed wins everywhere, including inside preload macros: later
//! preloads over earlier ones, the target over all preloads.
//!
//! ## Key Types
//!
//! - [`Helpers`]: Registry of functions callable from templates
//! - [`HelperFn`]: The boxed helper signature

mod compose;
mod engine;
mod helpers;

pub(crate) use engine::CompiledUnit;
pub use helpers::{HelperFn, Helpers};
