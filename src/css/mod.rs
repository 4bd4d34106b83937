//! CSS handling: stylesheet rule lists and the two codecs used to rewrite
//! `@font-face` sources.

pub mod declaration;
pub mod stylesheet;
pub mod value;

pub use declaration::{DeclItem, Declaration, RuleBlock};
pub use stylesheet::{CssRule, RuleKind, StyleSheet};
pub use value::{FunctionNode, ValueAst, ValueNode};
