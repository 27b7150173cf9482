use core::future::Future;

use feedwindow::{FeedItem, Selection};

/// A continuously updating query whose selection can be replaced at runtime.
///
/// After `update_selection` resolves, `items` returns the materialized results for the new
/// selection, in the selection's order. Changes to the underlying data are delivered separately as
/// [`feedwindow::Changeset`]s (see [`crate::Controller::on_changeset`]).
pub trait LiveQuery<T: FeedItem> {
    type Error: std::error::Error + 'static;

    /// The current materialized results.
    fn items(&self) -> Vec<T>;

    /// Replaces the active selection and resolves once the new results are materialized.
    fn update_selection(
        &mut self,
        selection: &Selection<T::Key>,
    ) -> impl Future<Output = Result<(), Self::Error>>;
}
