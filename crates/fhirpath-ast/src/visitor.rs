// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A read-only visitor over `Expression` trees, used by the static
//! analyzer and by tooling (e.g. collecting every `Identifier` name) that
//! doesn't want to hand-write the traversal.

use crate::expression::{Expression, ExpressionKind};

/// Implement this and call [`walk`] to traverse an expression tree without
/// re-deriving the recursion for every consumer.
pub trait Visitor {
    /// Called for every node before its children are visited. Return
    /// `true` to continue into the children, `false` to skip them.
    fn visit(&mut self, node: &Expression) -> bool {
        let _ = node;
        true
    }
}

/// Walk `node` depth-first, calling `visitor.visit` on each node in
/// pre-order.
pub fn walk<V: Visitor>(visitor: &mut V, node: &Expression) {
    if !visitor.visit(node) {
        return;
    }
    match &node.kind {
        ExpressionKind::Literal(_)
        | ExpressionKind::Identifier(_)
        | ExpressionKind::TypeOrIdentifier(_)
        | ExpressionKind::Variable(_)
        | ExpressionKind::Quantity(_)
        | ExpressionKind::Cursor(_)
        | ExpressionKind::Error(_) => {}
        ExpressionKind::Binary(data) => {
            walk(visitor, &data.left);
            walk(visitor, &data.right);
        }
        ExpressionKind::Unary(data) => walk(visitor, &data.operand),
        ExpressionKind::Function(data) => {
            walk(visitor, &data.callee);
            for arg in &data.arguments {
                walk(visitor, arg);
            }
        }
        ExpressionKind::Index(data) => {
            walk(visitor, &data.target);
            walk(visitor, &data.index);
        }
        ExpressionKind::MembershipTest(data) => walk(visitor, &data.target),
        ExpressionKind::TypeCast(data) => walk(visitor, &data.target),
        ExpressionKind::Collection(elements) => {
            for element in elements {
                walk(visitor, element);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::BinaryOperator;
    use crate::span::Span;

    struct Counter(usize);
    impl Visitor for Counter {
        fn visit(&mut self, _node: &Expression) -> bool {
            self.0 += 1;
            true
        }
    }

    #[test]
    fn counts_every_node_once() {
        let span = Span::empty_at(0);
        let expr = Expression::binary(
            BinaryOperator::Add,
            Expression::identifier("a", span),
            Expression::identifier("b", span),
        );
        let mut counter = Counter(0);
        walk(&mut counter, &expr);
        assert_eq!(counter.0, 3);
    }
}
