pub mod http_client;
pub mod nominatim;
pub mod pacer;

pub use http_client::ReqwestFetcher;
pub use nominatim::NominatimGeocoder;
pub use pacer::TokioPacer;
