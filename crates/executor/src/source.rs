use crate::item::WorkItem;
use std::collections::VecDeque;

/// The answer a [`Source`] gives when the executor asks for more work.
#[derive(Debug)]
pub enum Pull<T> {
    /// The next item to dispatch.
    Item(WorkItem<T>),
    /// Nothing right now, but more may arrive later.
    Starved,
    /// Nothing now and nothing ever again.
    Exhausted,
}

/// Pull-based supplier of [`WorkItem`]s.
///
/// Pulling is synchronous and must not block: a source waiting on a
/// producer answers [`Pull::Starved`] and the executor asks again after a
/// short poll interval (or as soon as an in-flight action settles).
pub trait Source<T> {
    fn pull(&mut self) -> Pull<T>;
}

impl<T> Source<T> for VecDeque<WorkItem<T>> {
    fn pull(&mut self) -> Pull<T> {
        self.pop_front().map_or(Pull::Exhausted, Pull::Item)
    }
}

impl<T> Source<T> for std::vec::IntoIter<WorkItem<T>> {
    fn pull(&mut self) -> Pull<T> {
        self.next().map_or(Pull::Exhausted, Pull::Item)
    }
}

impl<T, S: Source<T> + ?Sized> Source<T> for &mut S {
    fn pull(&mut self) -> Pull<T> {
        (**self).pull()
    }
}

impl<T, S: Source<T> + ?Sized> Source<T> for Box<S> {
    fn pull(&mut self) -> Pull<T> {
        (**self).pull()
    }
}

/// A [`Source`] backed by a closure. See [`from_fn`].
pub struct FnSource<F>(F);

/// Wraps a pull function into a [`Source`].
pub fn from_fn<T, F>(pull: F) -> FnSource<F>
where
    F: FnMut() -> Pull<T>,
{
    FnSource(pull)
}

impl<T, F> Source<T> for FnSource<F>
where
    F: FnMut() -> Pull<T>,
{
    fn pull(&mut self) -> Pull<T> {
        (self.0)()
    }
}
