use std::sync::Arc;

use tracing::debug;

use crate::codec::ToCqlValue;
use crate::config::ClusterConfig;
use crate::driver_future::{DriverFuture, pending, settled};
use crate::engine::Engine;
use crate::error::CqlMiddlewareDbError;
use crate::paging::PageIter;
use crate::prepared::Prepared;
use crate::results::QueryResult;
use crate::statement::Statement;
use crate::taxonomy::{DriverError, ErrorCode, LibraryError};

/// Cluster description plus the engine that will talk to it.
pub struct Cluster {
    config: ClusterConfig,
    engine: Arc<dyn Engine>,
}

impl Cluster {
    #[must_use]
    pub fn new(config: ClusterConfig, engine: Arc<dyn Engine>) -> Self {
        Self { config, engine }
    }

    #[must_use]
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Open a session.
    ///
    /// An invalid config settles the future immediately with `(Library, BadParams)` without
    /// reaching the engine.
    #[must_use]
    pub fn connect(&self) -> DriverFuture<Session> {
        if let Err(err) = self.config.validate() {
            return settled(
                "connect",
                Err(DriverError::new(
                    ErrorCode::Library(LibraryError::BadParams),
                    err.to_string(),
                )),
            );
        }
        debug!(
            contact_points = ?self.config.contact_points,
            port = self.config.port,
            "connecting"
        );

        let session = Session {
            engine: Arc::clone(&self.engine),
        };
        let (completer, future) = pending::<Session>("connect");
        self.engine
            .connect(&self.config, completer.map(move |()| session));
        future
    }
}

impl std::fmt::Debug for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A connected session. Clones share the same engine connection.
#[derive(Clone)]
pub struct Session {
    engine: Arc<dyn Engine>,
}

impl Session {
    /// Execute a statement. The statement is snapshotted, so it may be rebound immediately.
    #[must_use]
    pub fn execute(&self, statement: &Statement) -> DriverFuture<QueryResult> {
        let request = statement.to_request();
        debug!(
            query = %request.query,
            params = request.values.len(),
            page_size = ?request.page_size,
            resumed = request.paging_state.is_some(),
            "execute"
        );
        let (completer, future) = pending("execute");
        self.engine.execute(request, completer);
        future
    }

    #[must_use]
    pub fn prepare(&self, query: &str) -> DriverFuture<Prepared> {
        debug!(query, "prepare");
        let (completer, future) = pending("prepare");
        self.engine.prepare(query, completer);
        future
    }

    #[must_use]
    pub fn close(&self) -> DriverFuture<()> {
        debug!("closing session");
        let (completer, future) = pending("close");
        self.engine.close(completer);
        future
    }

    /// Build, bind and execute a one-off statement.
    ///
    /// # Errors
    ///
    /// Returns a local binding error before anything is sent; asynchronous failures surface
    /// through the returned future.
    pub fn query(
        &self,
        query: &str,
        values: &[&dyn ToCqlValue],
    ) -> Result<DriverFuture<QueryResult>, CqlMiddlewareDbError> {
        let mut statement = Statement::new(query, values.len());
        statement.bind_all(values)?;
        Ok(self.execute(&statement))
    }

    /// Page through `statement`'s results. See [`PageIter`].
    #[must_use]
    pub fn pages<'s>(&'s self, statement: &'s mut Statement) -> PageIter<'s> {
        PageIter::new(self, statement)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl DriverFuture<QueryResult> {
    /// Wait for and take the rows of an execute.
    ///
    /// # Errors
    ///
    /// Returns `CqlMiddlewareDbError::Driver` if the execute failed.
    pub fn result(self) -> Result<QueryResult, CqlMiddlewareDbError> {
        self.into_outcome()
    }
}

impl DriverFuture<Prepared> {
    /// Wait for and take the handle of a prepare.
    ///
    /// # Errors
    ///
    /// Returns `CqlMiddlewareDbError::Driver` if the prepare failed.
    pub fn prepared(self) -> Result<Prepared, CqlMiddlewareDbError> {
        self.into_outcome()
    }
}

impl DriverFuture<Session> {
    /// Wait for and take the connected session.
    ///
    /// # Errors
    ///
    /// Returns `CqlMiddlewareDbError::Driver` if connecting failed.
    pub fn session(self) -> Result<Session, CqlMiddlewareDbError> {
        self.into_outcome()
    }
}
