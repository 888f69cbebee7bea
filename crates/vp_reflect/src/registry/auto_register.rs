use crate::info::TypeInfo;

/// A statically submitted type, see [`register_type!`](crate::register_type).
pub struct TypeRegistration {
    build: fn() -> TypeInfo,
}

impl TypeRegistration {
    #[inline]
    pub const fn new(build: fn() -> TypeInfo) -> Self {
        Self { build }
    }

    #[inline]
    pub fn build(&self) -> TypeInfo {
        (self.build)()
    }
}

inventory::collect!(TypeRegistration);

pub(crate) fn registrations() -> impl Iterator<Item = &'static TypeRegistration> {
    inventory::iter::<TypeRegistration>.into_iter()
}

// Submitted by this crate, so it is only missing where static
// registration does not work on the target.
struct Available;

inventory::collect!(Available);
inventory::submit!(Available);

pub(crate) fn is_available() -> bool {
    inventory::iter::<Available>.into_iter().next().is_some()
}

/// Submits a type to [`TypeRegistry::auto_register`].
///
/// The argument is a `fn() -> TypeInfo`.
///
/// ```
/// use vp_reflect::info::{FieldInfo, TypeInfo};
/// use vp_reflect::registry::TypeRegistry;
/// use vp_reflect::ty::Type;
///
/// fn limits() -> TypeInfo {
///     TypeInfo::class("demo.Limits").with_field(FieldInfo::constant("MAX", Type::INT, 10))
/// }
///
/// vp_reflect::register_type!(limits);
///
/// fn main() {
///     let mut registry = TypeRegistry::new();
///     assert!(registry.auto_register());
///     assert!(registry.get_with_type_path("demo.Limits").is_some());
/// }
/// ```
///
/// [`TypeRegistry::auto_register`]: crate::registry::TypeRegistry::auto_register
#[macro_export]
macro_rules! register_type {
    ($build:expr) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::registry::TypeRegistration::new($build)
        }
    };
}
