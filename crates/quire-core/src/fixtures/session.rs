//! Fixture loading session.
//!
//! A [`FixtureSession`] is the explicit context for one batch of fixture loads: it owns
//! the source, the codec, the [`LoadBarrier`] and the [`FixtureRegistry`]. Loads run as
//! tokio tasks; each one registers with the barrier before its read is issued and
//! completes its token only after the fixture is in the registry.
//!
//! Read failures are fatal. [`FixtureSession::wait`] returns the first one and aborts
//! the remaining loads.

use super::barrier::LoadBarrier;
use super::registry::FixtureRegistry;
use super::source::FixtureSource;
use crate::archive::{Archive, ArchiveCodec, Compression, ZipCodec};
use crate::errors::{OracleError, OracleResult};
use std::io;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::task::JoinSet;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum LoadKind {
    Document,
    Raw,
}

pub struct FixtureSession {
    source: Arc<dyn FixtureSource>,
    codec: Arc<dyn ArchiveCodec>,
    barrier: Arc<LoadBarrier>,
    registry: Arc<RwLock<FixtureRegistry>>,
    tasks: JoinSet<OracleResult<()>>,
}

impl FixtureSession {
    /// Session decoding fixtures as zip containers.
    pub fn new(source: impl FixtureSource) -> Self {
        Self::with_codec(source, ZipCodec::new())
    }

    pub fn with_codec(source: impl FixtureSource, codec: impl ArchiveCodec + 'static) -> Self {
        Self {
            source: Arc::new(source),
            codec: Arc::new(codec),
            barrier: Arc::new(LoadBarrier::new()),
            registry: Arc::new(RwLock::new(FixtureRegistry::new())),
            tasks: JoinSet::new(),
        }
    }

    pub fn barrier(&self) -> &Arc<LoadBarrier> {
        &self.barrier
    }

    pub fn codec(&self) -> &dyn ArchiveCodec {
        self.codec.as_ref()
    }

    /// Begin a fresh batch of loads; `continuation` runs once the batch completes.
    /// Already registered fixtures are kept.
    pub fn on_ready(&self, continuation: impl FnOnce() + Send + 'static) {
        self.barrier.reset(continuation);
    }

    /// Load `name` as an archive fixture. Must be called inside a tokio runtime.
    pub fn load_document(&mut self, name: impl Into<String>) {
        self.spawn_load(name.into(), LoadKind::Document);
    }

    /// Load `name` as raw bytes (images and other binary inputs).
    pub fn load_image(&mut self, name: impl Into<String>) {
        self.spawn_load(name.into(), LoadKind::Raw);
    }

    fn spawn_load(&mut self, name: String, kind: LoadKind) {
        let token = self.barrier.begin_load();
        let source = Arc::clone(&self.source);
        let codec = Arc::clone(&self.codec);
        let registry = Arc::clone(&self.registry);

        self.tasks.spawn(async move {
            let raw = source
                .read_bytes(&name)
                .await
                .map_err(|source| OracleError::Load {
                    name: name.clone(),
                    source,
                })?;
            debug!(fixture = %name, bytes = raw.len(), ?kind, "fixture loaded");

            match kind {
                LoadKind::Document => {
                    let archive = codec.decode(&raw)?;
                    write(&registry).register_archive(name, archive, raw);
                }
                LoadKind::Raw => write(&registry).register(name, raw),
            }

            token.complete();
            Ok(())
        });
    }

    /// Signal that every load of the batch has been issued.
    pub fn start(&self) {
        self.barrier.start();
    }

    /// Wait for all issued loads. The first failure aborts the rest and is returned.
    pub async fn wait(&mut self) -> OracleResult<()> {
        while let Some(joined) = self.tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => Err(OracleError::Load {
                    name: "<cancelled>".into(),
                    source: io::Error::other(e),
                }),
            };
            if let Err(e) = outcome {
                self.tasks.abort_all();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Build a one-part archive with `xml` as the main document and register it.
    pub fn make_document(
        &self,
        name: impl Into<String>,
        xml: impl Into<bytes::Bytes>,
    ) -> OracleResult<Archive> {
        let archive = Archive::with_document(xml);
        let raw = self.codec.encode(&archive, Compression::Store)?;
        write(&self.registry).register_archive(name, archive.clone(), raw);
        Ok(archive)
    }

    /// Rebuild a fresh archive handle from the raw bytes registered under `name`,
    /// replacing the registered handle.
    pub fn create_document(&self, name: &str) -> OracleResult<Archive> {
        let raw = self.registry().raw(name)?.clone();
        let archive = self.codec.decode(&raw)?;
        write(&self.registry).register_archive(name, archive.clone(), raw);
        Ok(archive)
    }

    /// Read access to the registry. Do not hold the guard across an await point.
    pub fn registry(&self) -> RwLockReadGuard<'_, FixtureRegistry> {
        self.registry.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Owned copy of the registry.
    pub fn snapshot(&self) -> FixtureRegistry {
        self.registry().clone()
    }
}

fn write(registry: &RwLock<FixtureRegistry>) -> RwLockWriteGuard<'_, FixtureRegistry> {
    registry.write().unwrap_or_else(|e| e.into_inner())
}
