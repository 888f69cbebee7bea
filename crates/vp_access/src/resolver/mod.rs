//! Overload resolution and the member caches.
//!
//! [`best_method`] and [`best_constructor`] are pure scoring functions.
//! [`MemberResolver`] memoizes their results by [`SignatureKey`], so a
//! repeated lookup never scores again.

mod scoring;

pub use scoring::{TypeRelations, best_constructor, best_method};

use std::sync::Arc;

use vp_reflect::Type;
use vp_reflect::info::{ConstructorInfo, MethodInfo};
use vp_utils::CacheMap;
use vp_utils::hash::{Hashed, NoOpHashState};

// -----------------------------------------------------------------------------
// SignatureKey

/// Lookup flags that are part of a [`SignatureKey`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LookupFlags {
    /// Disables the conversion rule of the scoring table.
    pub require_exact: bool,
    /// Only static members are candidates.
    pub statics_only: bool,
}

/// Identifies one overload lookup.
///
/// `None` argument types stand for statically unknown arguments and compare
/// equal to each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureKey {
    pub declaring: Type,
    pub name: Arc<str>,
    pub args: Box<[Option<Type>]>,
    pub flags: LookupFlags,
    /// The conversion generation the lookup was scored in.
    pub conversions: u64,
}

impl SignatureKey {
    pub fn new(declaring: &Type, name: &str, args: &[Option<Type>], flags: LookupFlags) -> Self {
        Self {
            declaring: declaring.clone(),
            name: Arc::from(name),
            args: args.into(),
            flags,
            conversions: 0,
        }
    }

    fn scored_with(mut self, rel: &dyn TypeRelations) -> Self {
        self.conversions = rel.conversion_generation();
        self
    }

    /// `true` if `ty` is the declaring type or one of the argument types.
    pub fn mentions(&self, ty: &Type) -> bool {
        mentions(&self.declaring, ty) || self.args.iter().flatten().any(|arg| mentions(arg, ty))
    }
}

fn mentions(haystack: &Type, ty: &Type) -> bool {
    haystack == ty || haystack.element().is_some_and(|elem| mentions(elem, ty))
}

// -----------------------------------------------------------------------------
// MemberResolver

type SignatureCache<V> = CacheMap<Hashed<SignatureKey>, Option<Arc<V>>, NoOpHashState>;

/// Memoizing front of the scoring functions.
///
/// Holds three caches: best method and best constructor by signature, and
/// the constructor list by type. Misses call the candidate closure and score
/// without holding any lock. Signatures carry the conversion generation, so
/// registering a conversion never serves a lookup scored before it.
pub struct MemberResolver {
    methods: SignatureCache<MethodInfo>,
    constructors: SignatureCache<ConstructorInfo>,
    constructor_lists: CacheMap<Type, Arc<[Arc<ConstructorInfo>]>>,
}

impl MemberResolver {
    pub fn new(capacity: usize) -> Self {
        Self {
            methods: CacheMap::new("methods", capacity),
            constructors: CacheMap::new("constructors", capacity),
            constructor_lists: CacheMap::new("constructor lists", capacity),
        }
    }

    /// The best method named `name` on `declaring` for `args`.
    ///
    /// `candidates` is only called on a cache miss.
    pub fn resolve_method(
        &self,
        declaring: &Type,
        name: &str,
        args: &[Option<Type>],
        flags: LookupFlags,
        candidates: impl FnOnce() -> Vec<Arc<MethodInfo>>,
        rel: &dyn TypeRelations,
    ) -> Option<Arc<MethodInfo>> {
        let key = Hashed::new(SignatureKey::new(declaring, name, args, flags).scored_with(rel));
        if let Some(found) = self.methods.get(&key) {
            return found;
        }
        let candidates = candidates();
        let found = best_method(args, &candidates, flags.require_exact, rel).cloned();
        match &found {
            Some(method) => log::debug!("resolved `{}` on `{declaring}` to `{}`", key.name, method.signature()),
            None => log::debug!("no overload of `{name}` on `{declaring}` accepts {args:?}"),
        }
        self.methods.insert(key, found)
    }

    /// The best constructor of `declaring` for `args`.
    ///
    /// `candidates` is only called when neither the signature nor the
    /// constructor list of `declaring` is cached.
    pub fn resolve_constructor(
        &self,
        declaring: &Type,
        args: &[Option<Type>],
        candidates: impl FnOnce() -> Vec<Arc<ConstructorInfo>>,
        rel: &dyn TypeRelations,
    ) -> Option<Arc<ConstructorInfo>> {
        let key = SignatureKey::new(declaring, "new", args, LookupFlags::default()).scored_with(rel);
        let key = Hashed::new(key);
        if let Some(found) = self.constructors.get(&key) {
            return found;
        }
        let list = self.constructors(declaring, candidates);
        let found = best_constructor(args, &list, rel).cloned();
        log::debug!("resolved constructor of `{declaring}` for {args:?}: {}", found.is_some());
        self.constructors.insert(key, found)
    }

    /// The cached constructor list of `declaring`.
    pub fn constructors(
        &self,
        declaring: &Type,
        candidates: impl FnOnce() -> Vec<Arc<ConstructorInfo>>,
    ) -> Arc<[Arc<ConstructorInfo>]> {
        self.constructor_lists
            .get_or_insert_with(declaring.clone(), || Arc::from(candidates()))
    }

    /// Forgets every entry that mentions `ty`.
    pub fn invalidate(&self, ty: &Type) {
        let removed = self.methods.retain(|key, _| !key.mentions(ty))
            + self.constructors.retain(|key, _| !key.mentions(ty))
            + self.constructor_lists.retain(|key, _| !mentions(key, ty));
        log::debug!("invalidated {removed} member cache entries for `{ty}`");
    }

    /// Number of memoized method lookups, including failed ones.
    #[inline]
    pub fn cached_methods(&self) -> usize {
        self.methods.len()
    }

    /// Number of memoized constructor lookups, including failed ones.
    #[inline]
    pub fn cached_constructors(&self) -> usize {
        self.constructors.len()
    }
}

impl std::fmt::Debug for MemberResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberResolver")
            .field("methods", &self.methods)
            .field("constructors", &self.constructors)
            .field("constructor_lists", &self.constructor_lists)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Arc;

    use vp_reflect::info::{ConstructorInfo, MethodInfo};
    use vp_reflect::{Primitive, Type, Value};

    use super::{LookupFlags, MemberResolver, SignatureKey, TypeRelations};

    struct Exact;

    impl TypeRelations for Exact {
        fn is_assignable(&self, target: &Type, source: &Type) -> bool {
            target == source
        }

        fn can_convert(&self, _: &Type, _: Option<&Type>) -> bool {
            false
        }
    }

    fn overloads() -> Vec<Arc<MethodInfo>> {
        vec![
            Arc::new(MethodInfo::new("m", [Type::INT], Type::INT, |_, _| Ok(Value::Int(1)))),
            Arc::new(MethodInfo::new("m", [Type::Boxed(Primitive::Int)], Type::INT, |_, _| {
                Ok(Value::Int(2))
            })),
        ]
    }

    #[test]
    fn hits_skip_candidate_enumeration() {
        let resolver = MemberResolver::new(0);
        let ty = Type::named("demo.A");
        let calls = Cell::new(0);
        let lookup = || {
            resolver.resolve_method(&ty, "m", &[Some(Type::INT)], LookupFlags::default(), || {
                calls.set(calls.get() + 1);
                overloads()
            }, &Exact)
        };

        let first = lookup().unwrap();
        let second = lookup().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.params(), [Type::INT]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unknown_arguments_are_part_of_the_key() {
        let resolver = MemberResolver::new(0);
        let ty = Type::named("demo.A");
        let flags = LookupFlags::default();

        let found = resolver.resolve_method(&ty, "m", &[None], flags, overloads, &Exact).unwrap();
        assert_eq!(found.params(), [Type::Boxed(Primitive::Int)]);
        assert!(resolver.resolve_method(&ty, "m", &[Some(Type::BOOL)], flags, overloads, &Exact).is_none());
        assert_ne!(
            SignatureKey::new(&ty, "m", &[None], flags),
            SignatureKey::new(&ty, "m", &[Some(Type::Object)], flags),
        );
    }

    struct Generation(u64);

    impl TypeRelations for Generation {
        fn is_assignable(&self, target: &Type, source: &Type) -> bool {
            target == source
        }

        fn can_convert(&self, target: &Type, _: Option<&Type>) -> bool {
            self.0 > 0 && *target == Type::INT
        }

        fn conversion_generation(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn new_conversions_are_scored_again() {
        let resolver = MemberResolver::new(0);
        let ty = Type::named("demo.A");
        let args = [Some(Type::String)];
        let flags = LookupFlags::default();

        assert!(resolver.resolve_method(&ty, "m", &args, flags, overloads, &Generation(0)).is_none());
        let found = resolver.resolve_method(&ty, "m", &args, flags, overloads, &Generation(1)).unwrap();
        assert_eq!(found.params(), [Type::INT]);
        assert_eq!(resolver.cached_methods(), 2);
    }

    #[test]
    fn invalidation_drops_entries_mentioning_the_type() {
        let resolver = MemberResolver::new(0);
        let (a, b) = (Type::named("demo.A"), Type::named("demo.B"));
        let flags = LookupFlags::default();
        resolver.resolve_method(&a, "m", &[Some(Type::INT)], flags, overloads, &Exact);
        resolver.resolve_method(&b, "m", &[Some(Type::array_of(a.clone()))], flags, overloads, &Exact);
        resolver.resolve_method(&b, "m", &[Some(Type::INT)], flags, overloads, &Exact);
        let ctors = resolver.constructors(&a, || {
            vec![Arc::new(ConstructorInfo::new([], |_| Ok(Value::Null)))]
        });
        assert_eq!(ctors.len(), 1);

        resolver.invalidate(&a);
        assert_eq!(resolver.cached_methods(), 1);
        assert!(resolver.constructor_lists.is_empty());
    }
}
