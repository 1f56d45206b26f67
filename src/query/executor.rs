use crate::error::Result;
use crate::index::{IdSet, Index, ResultIdentifier};
use crate::query::cancel::CancellationToken;
use crate::query::node::QueryNode;
use crossbeam_channel::{Receiver, Sender, bounded};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace};

/// Evaluation options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    /// Bound of every result channel. Producers block once this many
    /// results are waiting; `0` hands results over one at a time.
    pub channel_capacity: usize,
    /// Checked by every producer before it emits a result
    #[serde(skip)]
    pub cancel: CancellationToken,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            cancel: CancellationToken::default(),
        }
    }
}

/// Lazily produced, single-consumer stream of matching documents.
///
/// A background producer fills the stream; iteration ends when it is
/// done. Dropping the stream early stops the producer at its next send.
pub struct ResultStream {
    rx: Receiver<ResultIdentifier>,
}

impl ResultStream {
    /// A stream that is already finished
    fn empty() -> Self {
        let (_, rx) = bounded(0);
        Self { rx }
    }

    /// Drain into a set, dropping duplicates.
    pub fn collect_set(self) -> IdSet {
        self.collect()
    }
}

impl Iterator for ResultStream {
    type Item = ResultIdentifier;

    fn next(&mut self) -> Option<ResultIdentifier> {
        self.rx.recv().ok()
    }
}

/// Write half handed to a producer
struct Sink {
    tx: Sender<ResultIdentifier>,
    cancel: CancellationToken,
}

impl Sink {
    /// `None` once the evaluation is cancelled or the consumer is gone.
    fn send(&self, id: ResultIdentifier) -> Option<()> {
        self.cancel.check()?;
        self.tx.send(id).ok()
    }

    fn send_all(&self, ids: impl IntoIterator<Item = ResultIdentifier>) -> Option<()> {
        for id in ids {
            self.send(id)?;
        }
        Some(())
    }
}

/// Run `produce` on its own thread, feeding the returned stream.
/// The stream ends when `produce` returns.
fn spawn_producer<F>(options: &EvalOptions, produce: F) -> ResultStream
where
    F: FnOnce(&Sink) -> Option<()> + Send + 'static,
{
    let (tx, rx) = bounded(options.channel_capacity);
    let sink = Sink {
        tx,
        cancel: options.cancel.clone(),
    };

    thread::spawn(move || {
        if produce(&sink).is_none() {
            trace!("producer stopped early");
        }
    });

    ResultStream { rx }
}

/// Drain a stream into a membership set, giving up if cancelled.
fn drain_into_set(stream: ResultStream, cancel: &CancellationToken) -> Option<IdSet> {
    let mut set = IdSet::new();
    for id in stream {
        cancel.check()?;
        set.insert(id);
    }
    Some(set)
}

/// Validate `tree` and start evaluating it against `index`.
pub fn evaluate(tree: &QueryNode, index: Arc<dyn Index>) -> Result<ResultStream> {
    evaluate_with(tree, index, EvalOptions::default())
}

/// [`evaluate`] with explicit options.
///
/// Validation errors are returned before any producer is started.
pub fn evaluate_with(
    tree: &QueryNode,
    index: Arc<dyn Index>,
    options: EvalOptions,
) -> Result<ResultStream> {
    tree.check(index.as_ref())?;

    if tracing::enabled!(tracing::Level::DEBUG) {
        debug!("evaluating {tree}\n{}", tree.explain(index.as_ref()));
    }

    Ok(tree.eval(index, &options))
}

impl QueryNode {
    /// Start evaluating a checked tree.
    pub(crate) fn eval(&self, index: Arc<dyn Index>, options: &EvalOptions) -> ResultStream {
        match self {
            QueryNode::Tag(tag) => {
                let tag = tag.clone();
                spawn_producer(options, move |sink| sink.send_all(index.query_tag_fuzzy(&tag)))
            }
            QueryNode::Equals(tag) => {
                let tag = tag.clone();
                spawn_producer(options, move |sink| sink.send_all(index.query_tag_exact(&tag)))
            }
            QueryNode::Alias { target, .. } => target.eval(index, options),
            QueryNode::And(left, right) => eval_and(left.clone(), right.clone(), index, options),
            QueryNode::Or(left, right) => eval_or(left.clone(), right.clone(), index, options),
            QueryNode::Not(operand) => eval_not(operand.clone(), index, options),
            QueryNode::Compare { op, left, right } => {
                // both were validated by check()
                let (Ok(name), Ok(bound)) = (left.attribute_name(), right.numeric_bound()) else {
                    return ResultStream::empty();
                };
                let op = *op;
                let name = name.to_string();

                spawn_producer(options, move |sink| {
                    trace!(attribute = %name, "querying typed tags");
                    for typed in index.query_typed_tags(&name) {
                        match typed.value.parse::<i64>() {
                            Ok(value) if op.holds(value, bound) => sink.send(typed.id)?,
                            Ok(_) => {}
                            Err(e) => trace!(
                                attribute = %name,
                                id = typed.id,
                                value = %typed.value,
                                "skipping non-numeric typed value: {e}"
                            ),
                        }
                    }
                    Some(())
                })
            }
        }
    }
}

/// Evaluate the cheaper side against the full index, then the other side
/// against an index filtered down to the cheap side's results.
fn eval_and(
    left: Arc<QueryNode>,
    right: Arc<QueryNode>,
    index: Arc<dyn Index>,
    options: &EvalOptions,
) -> ResultStream {
    let child_options = options.clone();

    spawn_producer(options, move |sink| {
        // ties go to the left
        let (cheap, expensive) = if left.cost(index.as_ref()) > right.cost(index.as_ref()) {
            (right, left)
        } else {
            (left, right)
        };

        debug!(cheap = %cheap, expensive = %expensive, "evaluating cheaper side first");
        let matches = drain_into_set(cheap.eval(index.clone(), &child_options), &sink.cancel)?;

        debug!(
            filtered = matches.len(),
            "evaluating expensive side against filtered index"
        );
        let filtered = index.create_filtered_index(matches);
        sink.send_all(expensive.eval(filtered, &child_options))
    })
}

/// Union of both sides, evaluated concurrently. Documents matching both
/// sides are emitted twice.
fn eval_or(
    left: Arc<QueryNode>,
    right: Arc<QueryNode>,
    index: Arc<dyn Index>,
    options: &EvalOptions,
) -> ResultStream {
    let child_options = options.clone();

    spawn_producer(options, move |sink| {
        let left = left.eval(index.clone(), &child_options);
        let right = right.eval(index, &child_options);

        thread::scope(|scope| {
            scope.spawn(move || sink.send_all(left));
            sink.send_all(right)
        });
        Some(())
    })
}

/// Every document in the index that the operand does not match.
fn eval_not(operand: Arc<QueryNode>, index: Arc<dyn Index>, options: &EvalOptions) -> ResultStream {
    let child_options = options.clone();

    spawn_producer(options, move |sink| {
        let excluded = drain_into_set(operand.eval(index.clone(), &child_options), &sink.cancel)?;
        sink.send_all(
            index
                .query_all()
                .into_iter()
                .filter(|id| !excluded.contains(*id)),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::index::{Document, MemoryIndex};
    use crate::query::create_query;

    fn sorted(stream: ResultStream) -> Vec<ResultIdentifier> {
        let mut ids: Vec<_> = stream.collect();
        ids.sort_unstable();
        ids
    }

    fn photo_index() -> Arc<MemoryIndex> {
        Arc::new(MemoryIndex::new(vec![
            Document::new(1).with_tag("germany").with_attribute("year", "2004"),
            Document::new(2).with_tag("germany").with_attribute("year", "2011"),
            Document::new(3).with_tag("france").with_attribute("year", "2011"),
            Document::new(4).with_tag("france").with_attribute("year", "unknown"),
            Document::new(5).with_tag("beach"),
        ]))
    }

    fn run(query: &str) -> Vec<ResultIdentifier> {
        let tree = create_query(query).unwrap();
        sorted(evaluate(&tree, photo_index()).unwrap())
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(run("year<2005"), vec![1]);
        assert_eq!(run("year<=2011"), vec![1, 2, 3]);
        assert_eq!(run("year>2004"), vec![2, 3]);
        assert_eq!(run("year>=2004"), vec![1, 2, 3]);
        assert_eq!(run("year==2011"), vec![2, 3]);
        assert_eq!(run("year==1999"), Vec::<ResultIdentifier>::new());
    }

    #[test]
    fn test_comparison_combined_with_tags() {
        assert_eq!(run("year==2011 && germany"), vec![2]);
        assert_eq!(run("france && !year:2011"), vec![4]);
    }

    #[test]
    fn test_type_error_is_reported_before_evaluation() {
        let tree = create_query("year<soon").unwrap();
        let err = evaluate(&tree, photo_index()).err();
        assert!(matches!(
            err,
            Some(QueryError::Type(msg)) if msg.contains("non-numeric right-hand side")
        ));
    }

    #[test]
    fn test_rendezvous_channels() {
        let tree = create_query("germany || france && !year==2011").unwrap();
        let options = EvalOptions {
            channel_capacity: 0,
            ..EvalOptions::default()
        };
        let ids = evaluate_with(&tree, photo_index(), options).unwrap().collect_set();
        assert_eq!(ids.iter().collect::<Vec<_>>(), vec![1, 2, 4]);
    }

    #[test]
    fn test_cancelled_evaluation_ends_early() {
        let tree = create_query("germany || france").unwrap();
        let options = EvalOptions::default();
        options.cancel.cancel();

        let ids: Vec<_> = evaluate_with(&tree, photo_index(), options).unwrap().collect();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_dropping_stream_stops_producers() {
        let documents = (0..10_000).map(|id| Document::new(id).with_tag("bulk")).collect();
        let index = Arc::new(MemoryIndex::new(documents));
        let tree = create_query("bulk || !nothing").unwrap();
        let options = EvalOptions {
            channel_capacity: 1,
            ..EvalOptions::default()
        };

        let mut stream = evaluate_with(&tree, index, options).unwrap();
        assert!(stream.next().is_some());
        drop(stream);
    }

    #[test]
    fn test_options_from_json() {
        let options: EvalOptions = serde_json::from_str(r#"{"channel_capacity": 8}"#).unwrap();
        assert_eq!(options.channel_capacity, 8);
        assert!(!options.cancel.is_cancelled());

        let defaults: EvalOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.channel_capacity, 256);
    }
}
