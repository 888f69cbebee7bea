//! Services shared by every accessor of a factory.

use std::sync::Arc;

use vp_reflect::convert::TypeConverter;
use vp_reflect::info::{ConstructorInfo, MethodInfo};
use vp_reflect::scope::TypeScope;
use vp_reflect::{ConversionError, Type, Value};
use vp_utils::CacheMap;

use crate::config::AccessConfig;
use crate::error::{AccessError, ErrorKind};
use crate::resolver::{LookupFlags, MemberResolver, TypeRelations};
use crate::segment::{Segment, tokenize};

/// Configuration, class scope, coercion rules and caches.
///
/// Accessors keep an `Arc` to the runtime that built them.
pub struct Runtime {
    config: AccessConfig,
    scope: TypeScope,
    converter: TypeConverter,
    resolver: MemberResolver,
    segments: CacheMap<Box<str>, Arc<[Segment]>>,
}

impl Runtime {
    pub fn new(config: AccessConfig, scope: TypeScope, converter: TypeConverter) -> Self {
        Self {
            resolver: MemberResolver::new(config.member_cache_capacity()),
            segments: CacheMap::new("segments", config.accessor_cache_capacity()),
            config,
            scope,
            converter,
        }
    }

    #[inline]
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    #[inline]
    pub fn scope(&self) -> &TypeScope {
        &self.scope
    }

    #[inline]
    pub fn converter(&self) -> &TypeConverter {
        &self.converter
    }

    #[inline]
    pub fn resolver(&self) -> &MemberResolver {
        &self.resolver
    }

    /// Tokenizes `path`, caching the segments by path text.
    pub fn segments(&self, path: &Arc<str>) -> Result<Arc<[Segment]>, AccessError> {
        self.segments.get_or_try_insert_with(Box::from(&**path), || {
            tokenize(path)
                .map(Arc::from)
                .map_err(|err| ErrorKind::from(err).at(path, err.offset()))
        })
    }

    /// The best method named `name` visible on `declaring`.
    pub fn resolve_method(
        &self,
        declaring: &Type,
        name: &str,
        args: &[Option<Type>],
        statics_only: bool,
    ) -> Option<Arc<MethodInfo>> {
        let flags = LookupFlags {
            require_exact: false,
            statics_only,
        };
        self.resolver.resolve_method(
            declaring,
            name,
            args,
            flags,
            || self.scope.methods_named(declaring, name, statics_only),
            self,
        )
    }

    /// The best constructor of `declaring`.
    pub fn resolve_constructor(&self, declaring: &Type, args: &[Option<Type>]) -> Option<Arc<ConstructorInfo>> {
        self.resolver
            .resolve_constructor(declaring, args, || self.scope.constructors(declaring), self)
    }

    /// `true` if `value` can be passed for `param` as is.
    pub fn accepts(&self, param: &Type, value: &Value) -> bool {
        if let Some(p) = value.primitive() {
            return param.primitive() == Some(p) || *param == Type::Object;
        }
        match value.runtime_type() {
            None => !param.is_primitive(),
            Some(source) => self.scope.is_assignable(param, &source),
        }
    }

    /// Passes `value` through, or converts it to `param`.
    pub fn coerce(&self, value: Value, param: &Type) -> Result<Value, ConversionError> {
        if self.accepts(param, &value) {
            Ok(value)
        } else {
            self.converter.convert(&value, param)
        }
    }

    /// Forgets member lookups involving `ty` and every resolved class name.
    pub fn invalidate(&self, ty: &Type) {
        self.resolver.invalidate(ty);
        self.scope.invalidate();
    }
}

impl TypeRelations for Runtime {
    #[inline]
    fn is_assignable(&self, target: &Type, source: &Type) -> bool {
        self.scope.is_assignable(target, source)
    }

    #[inline]
    fn can_convert(&self, target: &Type, source: Option<&Type>) -> bool {
        self.converter.can_convert(target, source)
    }

    #[inline]
    fn conversion_generation(&self) -> u64 {
        self.converter.generation()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("scope", &self.scope)
            .field("resolver", &self.resolver)
            .field("segments", &self.segments)
            .finish_non_exhaustive()
    }
}
