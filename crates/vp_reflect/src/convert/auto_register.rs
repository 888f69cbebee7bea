use crate::convert::Conversion;

/// A statically submitted conversion, see
/// [`register_conversion!`](crate::register_conversion).
pub struct ConversionRegistration {
    build: fn() -> Box<dyn Conversion>,
}

impl ConversionRegistration {
    #[inline]
    pub const fn new(build: fn() -> Box<dyn Conversion>) -> Self {
        Self { build }
    }

    #[inline]
    pub fn build(&self) -> Box<dyn Conversion> {
        (self.build)()
    }
}

inventory::collect!(ConversionRegistration);

pub(super) fn registrations() -> impl Iterator<Item = &'static ConversionRegistration> {
    inventory::iter::<ConversionRegistration>.into_iter()
}

/// Submits a conversion to [`TypeConverter::auto_register`].
///
/// The argument is a `fn() -> Box<dyn Conversion>`.
///
/// [`TypeConverter::auto_register`]: crate::convert::TypeConverter::auto_register
#[macro_export]
macro_rules! register_conversion {
    ($build:expr) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::convert::ConversionRegistration::new($build)
        }
    };
}
