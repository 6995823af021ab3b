//! Frame-type dispatch.
//!
//! Device logic registers one handler per [`FrameType`], and for ZDO traffic
//! (an APS data indication with profile 0) one handler per [`ZdoCluster`].
//! Handlers are plain function pointers so the table can be built once and
//! copied out before each call.

use std::collections::HashMap;
use std::fmt;

use zbhost_frame::{Frame, FrameType, ZdoCluster};

use crate::{Result, Scheduler};

/// A device-logic handler for one kind of inbound frame.
pub type FrameHandler<D> = fn(&mut Scheduler<D>, &Frame) -> Result<()>;

/// Where an inbound frame goes.
pub enum Route<D> {
    /// Handler registered for the frame type.
    Frame(FrameHandler<D>),
    /// Handler registered for a ZDO cluster.
    Zdo(ZdoCluster, FrameHandler<D>),
    /// A ZDO frame whose cluster has no handler.
    UnhandledCluster(Option<u16>),
    /// No handler at all.
    Unhandled,
}

/// Handlers keyed by frame type and ZDO cluster.
pub struct DispatchTable<D> {
    frames: HashMap<FrameType, FrameHandler<D>>,
    zdo_clusters: HashMap<ZdoCluster, FrameHandler<D>>,
}

impl<D> DispatchTable<D> {
    /// An empty table.
    pub fn new() -> Self {
        DispatchTable {
            frames: HashMap::new(),
            zdo_clusters: HashMap::new(),
        }
    }

    /// Register `handler` for `frame_type`.
    pub fn on_frame(mut self, frame_type: FrameType, handler: FrameHandler<D>) -> Self {
        self.frames.insert(frame_type, handler);
        self
    }

    /// Register `handler` for ZDO `cluster`.
    pub fn on_zdo(mut self, cluster: ZdoCluster, handler: FrameHandler<D>) -> Self {
        self.zdo_clusters.insert(cluster, handler);
        self
    }

    /// Pick the handler for `frame`.
    ///
    /// A ZDO frame goes to its cluster handler. Without one it falls back to
    /// the frame-type handler, if any.
    pub fn route(&self, frame: &Frame) -> Route<D> {
        if frame.is_zdo() {
            let cluster_id = frame.cluster_id();
            if let Some(cluster) = cluster_id.and_then(ZdoCluster::from_id) {
                if let Some(handler) = self.zdo_clusters.get(&cluster) {
                    return Route::Zdo(cluster, *handler);
                }
            }
            if !self.frames.contains_key(&frame.frame_type) {
                return Route::UnhandledCluster(cluster_id);
            }
        }
        match self.frames.get(&frame.frame_type) {
            Some(handler) => Route::Frame(*handler),
            None => Route::Unhandled,
        }
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.zdo_clusters.is_empty()
    }
}

impl<D> Default for DispatchTable<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for DispatchTable<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut frames: Vec<_> = self.frames.keys().collect();
        frames.sort();
        let mut clusters: Vec<_> = self.zdo_clusters.keys().map(|c| c.id()).collect();
        clusters.sort();
        f.debug_struct("DispatchTable")
            .field("frames", &frames)
            .field("zdo_clusters", &clusters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbhost_frame::{FIELD_CLUSTER_ID, FIELD_PROFILE_ID};

    fn version(_: &mut Scheduler<()>, _: &Frame) -> Result<()> {
        Ok(())
    }

    fn lqi(_: &mut Scheduler<()>, _: &Frame) -> Result<()> {
        Ok(())
    }

    fn zdo_frame(cluster: u16) -> Frame {
        Frame::new(FrameType::ApsDataIndication)
            .with(FIELD_PROFILE_ID, 0u16)
            .with(FIELD_CLUSTER_ID, cluster)
    }

    #[test]
    fn test_routes() {
        let table = DispatchTable::<()>::new()
            .on_frame(FrameType::Version, version)
            .on_zdo(ZdoCluster::ManagementLqiResponse, lqi);

        assert!(matches!(
            table.route(&Frame::new(FrameType::Version)),
            Route::Frame(_)
        ));
        assert!(matches!(
            table.route(&zdo_frame(0x8031)),
            Route::Zdo(ZdoCluster::ManagementLqiResponse, _)
        ));
        assert!(matches!(
            table.route(&zdo_frame(0x8005)),
            Route::UnhandledCluster(Some(0x8005))
        ));
        assert!(matches!(
            table.route(&Frame::new(FrameType::DeviceState)),
            Route::Unhandled
        ));
    }

    #[test]
    fn test_non_zdo_indication_uses_frame_handler() {
        let table = DispatchTable::<()>::new().on_frame(FrameType::ApsDataIndication, version);
        let frame = Frame::new(FrameType::ApsDataIndication).with(FIELD_PROFILE_ID, 0x0104u16);
        assert!(matches!(table.route(&frame), Route::Frame(_)));
        assert!(matches!(table.route(&zdo_frame(0x9999)), Route::Frame(_)));
    }
}
