use feedwindow::Mode;

/// Errors returned by [`crate::Controller`] operations that requery the live query.
#[derive(Debug, thiserror::Error)]
pub enum Error<E>
where
    E: std::error::Error + 'static,
{
    /// The live query rejected a new selection. The feed was rolled back to its previous mode.
    #[error("requery for {mode} selection failed")]
    Requery {
        mode: Mode,
        #[source]
        source: E,
    },
}

impl<E> Error<E>
where
    E: std::error::Error + 'static,
{
    /// The mode the failed selection would have entered.
    pub fn mode(&self) -> Mode {
        match self {
            Self::Requery { mode, .. } => *mode,
        }
    }
}
