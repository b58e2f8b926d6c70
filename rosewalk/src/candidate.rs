//! Lazy shrink trees: a value paired with the simpler values it can be reduced to.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Deferred derivation of a node's children from the node's own value.
type Pending<T> = Box<dyn FnOnce(&T) -> Vec<Candidate<T>> + Send>;

/// A node of a shrink tree.
///
/// A candidate holds a realized value and an ordered list of simpler candidates. The list is
/// only derived the first time [`Candidate::children`] is called and is kept for every later
/// call, so deep or even infinite trees cost nothing until a walk actually reaches them.
///
/// ```rust
/// use rosewalk::Candidate;
///
/// let tree = Candidate::unfold(8u32, |n| if *n == 0 { vec![] } else { vec![n / 2] });
/// let child = &tree.children()[0];
/// assert_eq!(*child.value(), 4);
/// assert_eq!(*child.children()[0].value(), 2);
/// ```
pub struct Candidate<T> {
    value: T,
    children: OnceLock<Vec<Candidate<T>>>,
    pending: Mutex<Option<Pending<T>>>,
}

impl<T> Candidate<T> {
    /// Create a candidate whose children are produced by `children` on first access.
    pub fn new<F>(value: T, children: F) -> Self
    where
        F: FnOnce() -> Vec<Candidate<T>> + Send + 'static,
    {
        Self::with_pending(value, Box::new(move |_: &T| children()))
    }

    /// Create a candidate that cannot be shrunk any further.
    pub fn leaf(value: T) -> Self {
        Self {
            value,
            children: OnceLock::from(Vec::new()),
            pending: Mutex::new(None),
        }
    }

    fn with_pending(value: T, pending: Pending<T>) -> Self {
        Self {
            value,
            children: OnceLock::new(),
            pending: Mutex::new(Some(pending)),
        }
    }

    /// The realized value of this node.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consume the node, keeping only its value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// The simpler candidates of this node, in the order a walk should try them.
    ///
    /// The first call derives the children; later calls return the same nodes.
    pub fn children(&self) -> &[Candidate<T>] {
        self.children.get_or_init(|| {
            let pending = self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            pending.map_or_else(Vec::new, |derive| derive(&self.value))
        })
    }

    /// Whether this node has no simpler candidates. Realizes the children.
    pub fn is_empty(&self) -> bool {
        self.children().is_empty()
    }

    /// Whether the children have been derived yet.
    pub fn is_realized(&self) -> bool {
        self.children.get().is_some()
    }
}

impl<T: Send + 'static> Candidate<T> {
    /// Build a tree by repeatedly applying `shrinker`, one level at a time as the tree is
    /// explored.
    pub fn unfold<F>(value: T, shrinker: F) -> Self
    where
        F: Fn(&T) -> Vec<T> + Send + Sync + 'static,
    {
        Self::unfold_shared(value, Arc::new(shrinker))
    }

    fn unfold_shared(value: T, shrinker: Arc<dyn Fn(&T) -> Vec<T> + Send + Sync>) -> Self {
        let pending: Pending<T> = Box::new(move |parent: &T| {
            shrinker(parent)
                .into_iter()
                .map(|simpler| Self::unfold_shared(simpler, Arc::clone(&shrinker)))
                .collect()
        });
        Self::with_pending(value, pending)
    }

    /// Map every value of the tree with `f`.
    ///
    /// Children that were already realized are reused; pending ones stay pending.
    pub fn map<U, F>(self, f: F) -> Candidate<U>
    where
        U: Send + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.map_shared(Arc::new(f))
    }

    fn map_shared<U>(self, f: Arc<dyn Fn(&T) -> U + Send + Sync>) -> Candidate<U>
    where
        U: Send + 'static,
    {
        let mapped = f(&self.value);
        let Candidate {
            value,
            children,
            pending,
        } = self;
        let pending = pending.into_inner().unwrap_or_else(PoisonError::into_inner);

        let derive: Pending<U> = Box::new(move |_: &U| {
            let realized = match children.into_inner() {
                Some(children) => children,
                None => pending.map_or_else(Vec::new, |derive| derive(&value)),
            };
            realized
                .into_iter()
                .map(|child| child.map_shared(Arc::clone(&f)))
                .collect()
        });
        Candidate::with_pending(mapped, derive)
    }
}

impl<T: fmt::Debug> fmt::Debug for Candidate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("value", &self.value)
            .field("children", &self.children.get().map(Vec::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_leaf_is_empty() {
        let leaf = Candidate::leaf(7);
        assert_eq!(*leaf.value(), 7);
        assert!(leaf.is_realized());
        assert!(leaf.is_empty());
    }

    #[test]
    fn test_children_are_not_derived_until_requested() {
        let derived = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&derived);
        let tree = Candidate::new(10, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![Candidate::leaf(5), Candidate::leaf(0)]
        });

        assert!(!tree.is_realized());
        assert_eq!(derived.load(Ordering::SeqCst), 0);

        let values: Vec<i32> = tree.children().iter().map(|c| *c.value()).collect();
        assert_eq!(values, vec![5, 0]);
        assert_eq!(derived.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_children_are_memoized() {
        let derived = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&derived);
        let tree = Candidate::new("root", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![Candidate::leaf("child")]
        });

        let first = tree.children().as_ptr();
        let second = tree.children().as_ptr();
        assert_eq!(first, second);
        assert_eq!(derived.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unfold_is_lazy_per_level() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        // Infinite tree: every value has a larger neighbour.
        let tree = Candidate::unfold(0u64, move |n| {
            seen.fetch_add(1, Ordering::SeqCst);
            vec![n + 1]
        });

        let mut node = &tree;
        for expected in 1..=5 {
            node = &node.children()[0];
            assert_eq!(*node.value(), expected);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(!node.is_realized());
    }

    #[test]
    fn test_map_keeps_shape() {
        let tree = Candidate::unfold(4u8, |n| if *n == 0 { vec![] } else { vec![n - 1] });
        let mapped = tree.map(|n| format!("#{}", n));

        assert_eq!(mapped.value(), "#4");
        assert_eq!(mapped.children()[0].value(), "#3");
        assert_eq!(mapped.children()[0].children()[0].value(), "#2");
    }

    #[test]
    fn test_map_reuses_realized_children() {
        let derived = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&derived);
        let tree = Candidate::new(3, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![Candidate::leaf(1)]
        });
        assert_eq!(tree.children().len(), 1);

        let mapped = tree.map(|n| n * 10);
        assert_eq!(*mapped.children()[0].value(), 10);
        assert_eq!(derived.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_candidate_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Candidate<String>>();
    }

    #[test]
    fn test_debug_reports_realized_children() {
        let tree = Candidate::new(2, || vec![Candidate::leaf(1)]);
        assert_eq!(
            format!("{:?}", tree),
            "Candidate { value: 2, children: None }"
        );
        tree.children();
        assert_eq!(
            format!("{:?}", tree),
            "Candidate { value: 2, children: Some(1) }"
        );
    }
}
