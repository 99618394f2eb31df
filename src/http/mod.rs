pub mod bodycodec;
pub mod multipart;
pub mod orderedheaders;
pub mod requestbody;
pub mod response;
pub mod streamfactory;
pub mod transaction;

pub use bodycodec::ResponseData;
pub use multipart::MultipartWriter;
pub use orderedheaders::OrderedHeaderMap;
pub use requestbody::{BodyWriter, RequestBody};
pub use response::{HttpResponse, ResponseResult};
