//! Stack evaluation of compiled boolean expressions.
//!
//! Operands stay unresolved on the stack until an operator consumes them, so
//! posting lookups only happen for keywords that take part in the result.
//! Results are sets: their order carries no meaning.

use ahash::AHashSet;

use crate::error::Result;
use crate::query::expression::{Operator, PostfixToken};
use crate::store::DocId;

/// Resolves keywords to document ids for the evaluator.
pub trait KeywordResolver {
    /// Documents with a posting for `keyword`. `is_last` marks the query's
    /// last keyword, which must be resolved uncapped; others may be
    /// truncated to the resolver's limit.
    fn matching(&mut self, keyword: &str, is_last: bool) -> Result<Vec<DocId>>;

    /// Documents having some posting, minus those with a posting for
    /// `keyword`.
    fn excluding(&mut self, keyword: &str) -> Result<Vec<DocId>>;

    /// Documents having some posting.
    fn universe(&mut self) -> Result<Vec<DocId>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StackItem {
    Unresolved(String),
    Resolved(Vec<DocId>),
}

/// Evaluates postfix token sequences.
///
/// Operands equal to the query's last keyword are resolved uncapped; the
/// final combination needs its complete candidate set while earlier
/// keywords may be truncated.
#[derive(Debug, Clone, Default)]
pub struct BooleanEvaluator {
    last_keyword: Option<String>,
}

impl BooleanEvaluator {
    pub fn new(last_keyword: Option<&str>) -> Self {
        BooleanEvaluator {
            last_keyword: last_keyword.map(str::to_string),
        }
    }

    /// Run `postfix` and return the unordered, deduplicated result set.
    ///
    /// Missing operands count as the empty set; an empty expression yields
    /// no documents.
    pub fn evaluate(
        &self,
        postfix: &[PostfixToken],
        resolver: &mut dyn KeywordResolver,
    ) -> Result<Vec<DocId>> {
        let mut stack: Vec<StackItem> = Vec::new();

        for token in postfix {
            match token {
                PostfixToken::Operand(keyword) => stack.push(StackItem::Unresolved(keyword.clone())),
                PostfixToken::Operator(Operator::And) => {
                    let left = self.resolve(stack.pop(), resolver)?;
                    let right = self.resolve(stack.pop(), resolver)?;
                    stack.push(StackItem::Resolved(intersection(left, &right)));
                }
                PostfixToken::Operator(Operator::Or) => {
                    let left = self.resolve(stack.pop(), resolver)?;
                    let right = self.resolve(stack.pop(), resolver)?;
                    stack.push(StackItem::Resolved(union(left, right)));
                }
                PostfixToken::Operator(Operator::Not) => {
                    let negated = match stack.pop() {
                        Some(StackItem::Unresolved(keyword)) => resolver.excluding(&keyword)?,
                        Some(StackItem::Resolved(docs)) => difference(resolver.universe()?, &docs),
                        None => resolver.universe()?,
                    };
                    stack.push(StackItem::Resolved(negated));
                }
            }
        }

        let top = self.resolve(stack.pop(), resolver)?;
        Ok(dedup(top))
    }

    fn resolve(
        &self,
        item: Option<StackItem>,
        resolver: &mut dyn KeywordResolver,
    ) -> Result<Vec<DocId>> {
        match item {
            Some(StackItem::Resolved(docs)) => Ok(docs),
            Some(StackItem::Unresolved(keyword)) => {
                let is_last = self.last_keyword.as_deref() == Some(keyword.as_str());
                resolver.matching(&keyword, is_last)
            }
            None => Ok(Vec::new()),
        }
    }
}

fn intersection(left: Vec<DocId>, right: &[DocId]) -> Vec<DocId> {
    let right: AHashSet<DocId> = right.iter().copied().collect();
    dedup(left.into_iter().filter(|doc| right.contains(doc)).collect())
}

fn union(left: Vec<DocId>, right: Vec<DocId>) -> Vec<DocId> {
    let mut merged = left;
    merged.extend(right);
    dedup(merged)
}

fn difference(universe: Vec<DocId>, removed: &[DocId]) -> Vec<DocId> {
    let removed: AHashSet<DocId> = removed.iter().copied().collect();
    universe
        .into_iter()
        .filter(|doc| !removed.contains(doc))
        .collect()
}

/// Drop repeated ids, keeping first occurrences.
fn dedup(docs: Vec<DocId>) -> Vec<DocId> {
    let mut seen = AHashSet::with_capacity(docs.len());
    docs.into_iter().filter(|doc| seen.insert(*doc)).collect()
}
