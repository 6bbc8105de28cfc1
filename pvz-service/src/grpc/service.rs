//! PvzService gRPC implementation.

use prost_types::Timestamp;
use service_core::grpc::IntoStatus;
use tonic::{Request, Response, Status};
use tracing::{info, instrument, warn};

use crate::grpc::proto::{
    pvz_service_server::PvzService as PvzServiceRpc, GetPvzListRequest, GetPvzListResponse,
    Pvz as ProtoPvz,
};
use crate::models::PickupPoint;
use crate::services::metrics::GRPC_REQUESTS_TOTAL;
use crate::services::PvzService;

/// Read-only gRPC facade over [`PvzService`].
pub struct PvzServiceImpl {
    pvz: PvzService,
}

impl PvzServiceImpl {
    pub fn new(pvz: PvzService) -> Self {
        Self { pvz }
    }

    fn pvz_to_proto(pvz: &PickupPoint) -> ProtoPvz {
        ProtoPvz {
            id: pvz.id.to_string(),
            registration_date: Some(Timestamp {
                seconds: pvz.registration_date.timestamp(),
                nanos: pvz.registration_date.timestamp_subsec_nanos() as i32,
            }),
            city: pvz.city.as_str().to_string(),
        }
    }
}

#[tonic::async_trait]
impl PvzServiceRpc for PvzServiceImpl {
    #[instrument(skip(self, _request), fields(service = "pvz-service", method = "GetPvzList"))]
    async fn get_pvz_list(
        &self,
        _request: Request<GetPvzListRequest>,
    ) -> Result<Response<GetPvzListResponse>, Status> {
        let points = self.pvz.list_pickup_points().await.map_err(|e| {
            warn!(error = %e, "Failed to list pickup points");
            GRPC_REQUESTS_TOTAL
                .with_label_values(&["GetPvzList", e.kind()])
                .inc();
            e.into_status()
        })?;

        GRPC_REQUESTS_TOTAL
            .with_label_values(&["GetPvzList", "ok"])
            .inc();

        info!(count = points.len(), "Pickup points listed");

        Ok(Response::new(GetPvzListResponse {
            pvzs: points.iter().map(Self::pvz_to_proto).collect(),
        }))
    }
}
