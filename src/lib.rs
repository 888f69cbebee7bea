#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use vp_access as access;
pub use vp_reflect as reflect;
pub use vp_utils as utils;
