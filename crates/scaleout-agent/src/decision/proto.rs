//! Decision-service wire types
//!
//! Hand-maintained prost message stubs matching `proto/scaleout/v1/
//! decision.proto`, plus a unary tonic client. With the `proto-gen` feature
//! the types are generated at build time instead.

#[cfg(feature = "proto-gen")]
pub mod scaleout {
    pub mod v1 {
        tonic::include_proto!("scaleout.v1");
    }
}

// Stub types used when proto generation is not enabled
#[cfg(not(feature = "proto-gen"))]
pub mod scaleout {
    pub mod v1 {
        use prost::Message;

        #[derive(Clone, PartialEq, Message)]
        pub struct AppStartRequest {
            #[prost(string, tag = "1")]
            pub application_id: String,
            #[prost(string, tag = "2")]
            pub app_name: String,
            #[prost(int64, tag = "3")]
            pub app_time: i64,
            #[prost(bool, tag = "4")]
            pub is_adaptive: bool,
            #[prost(string, tag = "5")]
            pub app_specs: String,
            #[prost(string, tag = "6")]
            pub driver_specs: String,
            #[prost(string, tag = "7")]
            pub executor_specs: String,
            #[prost(string, tag = "8")]
            pub environment_specs: String,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct AppStartResponse {
            #[prost(string, tag = "1")]
            pub app_event_id: String,
            #[prost(uint32, tag = "2")]
            pub recommended_scale_out: u32,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct JobStartRequest {
            #[prost(string, tag = "1")]
            pub app_event_id: String,
            #[prost(int64, tag = "2")]
            pub app_time: i64,
            #[prost(int64, tag = "3")]
            pub job_id: i64,
            #[prost(uint32, tag = "4")]
            pub num_executors: u32,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct RecommendationResponse {
            #[prost(uint32, tag = "1")]
            pub recommended_scale_out: u32,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct StageMetrics {
            #[prost(int64, optional, tag = "1")]
            pub submission_time: Option<i64>,
            #[prost(int64, tag = "2")]
            pub completion_time: i64,
            #[prost(uint32, tag = "3")]
            pub scale_out_at_submit: u32,
            #[prost(double, tag = "4")]
            pub rescaling_time_ratio: f64,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct JobEndRequest {
            #[prost(string, tag = "1")]
            pub app_event_id: String,
            #[prost(int64, tag = "2")]
            pub app_time: i64,
            #[prost(int64, tag = "3")]
            pub job_id: i64,
            #[prost(uint32, tag = "4")]
            pub num_executors: u32,
            #[prost(double, tag = "5")]
            pub rescaling_time_ratio: f64,
            #[prost(map = "int64, message", tag = "6")]
            pub stages: ::std::collections::HashMap<i64, StageMetrics>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct AppEndRequest {
            #[prost(string, tag = "1")]
            pub app_event_id: String,
            #[prost(int64, tag = "2")]
            pub app_time: i64,
            #[prost(uint32, tag = "3")]
            pub num_executors: u32,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct AppEndResponse {
            #[prost(bool, tag = "1")]
            pub acknowledged: bool,
        }

        pub mod decision_service_client {
            use super::*;
            use tonic::codegen::http;
            use tonic::transport::Channel;

            #[derive(Debug, Clone)]
            pub struct DecisionServiceClient {
                inner: tonic::client::Grpc<Channel>,
            }

            impl DecisionServiceClient {
                pub fn new(channel: Channel) -> Self {
                    let inner = tonic::client::Grpc::new(channel);
                    Self { inner }
                }

                pub async fn report_app_start(
                    &mut self,
                    request: impl tonic::IntoRequest<AppStartRequest>,
                ) -> Result<tonic::Response<AppStartResponse>, tonic::Status> {
                    self.inner.ready().await.map_err(|e| {
                        tonic::Status::new(
                            tonic::Code::Unknown,
                            format!("Service was not ready: {}", e),
                        )
                    })?;
                    let codec = tonic::codec::ProstCodec::default();
                    let path = http::uri::PathAndQuery::from_static(
                        "/scaleout.v1.DecisionService/ReportAppStart",
                    );
                    self.inner.unary(request.into_request(), path, codec).await
                }

                pub async fn report_job_start(
                    &mut self,
                    request: impl tonic::IntoRequest<JobStartRequest>,
                ) -> Result<tonic::Response<RecommendationResponse>, tonic::Status> {
                    self.inner.ready().await.map_err(|e| {
                        tonic::Status::new(
                            tonic::Code::Unknown,
                            format!("Service was not ready: {}", e),
                        )
                    })?;
                    let codec = tonic::codec::ProstCodec::default();
                    let path = http::uri::PathAndQuery::from_static(
                        "/scaleout.v1.DecisionService/ReportJobStart",
                    );
                    self.inner.unary(request.into_request(), path, codec).await
                }

                pub async fn report_job_end(
                    &mut self,
                    request: impl tonic::IntoRequest<JobEndRequest>,
                ) -> Result<tonic::Response<RecommendationResponse>, tonic::Status> {
                    self.inner.ready().await.map_err(|e| {
                        tonic::Status::new(
                            tonic::Code::Unknown,
                            format!("Service was not ready: {}", e),
                        )
                    })?;
                    let codec = tonic::codec::ProstCodec::default();
                    let path = http::uri::PathAndQuery::from_static(
                        "/scaleout.v1.DecisionService/ReportJobEnd",
                    );
                    self.inner.unary(request.into_request(), path, codec).await
                }

                pub async fn report_app_end(
                    &mut self,
                    request: impl tonic::IntoRequest<AppEndRequest>,
                ) -> Result<tonic::Response<AppEndResponse>, tonic::Status> {
                    self.inner.ready().await.map_err(|e| {
                        tonic::Status::new(
                            tonic::Code::Unknown,
                            format!("Service was not ready: {}", e),
                        )
                    })?;
                    let codec = tonic::codec::ProstCodec::default();
                    let path = http::uri::PathAndQuery::from_static(
                        "/scaleout.v1.DecisionService/ReportAppEnd",
                    );
                    self.inner.unary(request.into_request(), path, codec).await
                }
            }
        }
    }
}

pub use scaleout::v1::decision_service_client::DecisionServiceClient;
pub use scaleout::v1::*;
