pub mod descriptor;
pub mod response;
