//! Conversion state shared across one tree walk.

use std::collections::HashMap;

use crate::dom::Rect;
use crate::options::ResolvedOptions;
use crate::svg::{NodeId, SvgDocument};

/// Mutable state threaded through a single conversion.
///
/// A context borrows its output document, so it is exclusive to one call and
/// cannot outlive it.
#[derive(Debug)]
pub struct ConversionContext<'a> {
    pub svg_document: &'a mut SvgDocument,
    /// Where the walker appends the next output node.
    pub current_svg_parent: NodeId,
    /// Paint-order groups of the enclosing stacking context.
    pub stacking_layers: StackingLayers,
    /// The output node of the enclosing stacking context.
    pub parent_stacking_layer: NodeId,
    pub ids: IdGenerator,
    /// Generated label ids, keyed by the `id` of the labelled element.
    pub labels: HashMap<String, String>,
    /// Clip paths of ancestors, innermost last.
    pub ancestor_masks: Vec<AncestorMask>,
    pub options: ResolvedOptions,
}

/// A clip applied by an ancestor element.
#[derive(Debug, Clone, PartialEq)]
pub struct AncestorMask {
    /// Id of the `<clipPath>` element.
    pub id: String,
    pub rect: Rect,
}

/// Mints document-unique ids, counting separately per prefix.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counters: HashMap<String, u32>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `next("clip")` yields `clip1`, `clip2`, …
    pub fn next(&mut self, prefix: &str) -> String {
        let count = self.counters.entry(prefix.to_owned()).or_insert(0);
        *count += 1;
        format!("{prefix}{count}")
    }
}

/// The layers of a stacking context, in painting order (CSS 2.1 Appendix E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StackingLayer {
    RootBackgroundAndBorders,
    ChildStackingContextsWithNegativeStackLevels,
    InFlowNonInlineNonPositionedDescendants,
    NonPositionedFloats,
    InFlowInlineLevelNonPositionedDescendants,
    ChildStackingContextsWithStackLevelZeroAndPositionedDescendantsWithStackLevelZero,
    ChildStackingContextsWithPositiveStackLevels,
}

impl StackingLayer {
    pub const ALL: [StackingLayer; 7] = [
        StackingLayer::RootBackgroundAndBorders,
        StackingLayer::ChildStackingContextsWithNegativeStackLevels,
        StackingLayer::InFlowNonInlineNonPositionedDescendants,
        StackingLayer::NonPositionedFloats,
        StackingLayer::InFlowInlineLevelNonPositionedDescendants,
        StackingLayer::ChildStackingContextsWithStackLevelZeroAndPositionedDescendantsWithStackLevelZero,
        StackingLayer::ChildStackingContextsWithPositiveStackLevels,
    ];

    /// Value of the `data-stacking-layer` attribute.
    pub fn name(self) -> &'static str {
        match self {
            StackingLayer::RootBackgroundAndBorders => "rootBackgroundAndBorders",
            StackingLayer::ChildStackingContextsWithNegativeStackLevels => {
                "childStackingContextsWithNegativeStackLevels"
            }
            StackingLayer::InFlowNonInlineNonPositionedDescendants => {
                "inFlowNonInlineNonPositionedDescendants"
            }
            StackingLayer::NonPositionedFloats => "nonPositionedFloats",
            StackingLayer::InFlowInlineLevelNonPositionedDescendants => {
                "inFlowInlineLevelNonPositionedDescendants"
            }
            StackingLayer::ChildStackingContextsWithStackLevelZeroAndPositionedDescendantsWithStackLevelZero => {
                "childStackingContextsWithStackLevelZeroAndPositionedDescendantsWithStackLevelZero"
            }
            StackingLayer::ChildStackingContextsWithPositiveStackLevels => {
                "childStackingContextsWithPositiveStackLevels"
            }
        }
    }
}

/// Output groups for each [`StackingLayer`] of one stacking context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackingLayers {
    groups: [NodeId; 7],
}

impl StackingLayers {
    /// Append one `<g data-stacking-layer>` per layer to `parent`.
    pub fn create(document: &mut SvgDocument, parent: NodeId) -> Self {
        let groups = StackingLayer::ALL.map(|layer| {
            let group = document.append_element(parent, "g");
            document.set_attribute(group, "data-stacking-layer", layer.name());
            group
        });
        Self { groups }
    }

    pub fn get(&self, layer: StackingLayer) -> NodeId {
        let index = StackingLayer::ALL
            .iter()
            .position(|l| *l == layer)
            .unwrap_or_default();
        self.groups[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_count_per_prefix() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next("clip"), "clip1");
        assert_eq!(ids.next("clip"), "clip2");
        assert_eq!(ids.next("label"), "label1");
        assert_eq!(ids.next("clip"), "clip3");
    }

    #[test]
    fn stacking_layers_are_appended_in_paint_order() {
        let mut doc = SvgDocument::new();
        let root = doc.root();
        let layers = StackingLayers::create(&mut doc, root);
        let names: Vec<_> = doc
            .children(root)
            .iter()
            .map(|id| doc.attribute(*id, "data-stacking-layer").unwrap_or_default())
            .collect();
        let expected: Vec<_> = StackingLayer::ALL.iter().map(|l| l.name()).collect();
        assert_eq!(names, expected);
        assert_eq!(
            layers.get(StackingLayer::NonPositionedFloats),
            doc.children(root)[3]
        );
    }
}
