pub mod completion_dto;
pub mod quiz_dto;
pub mod request;
