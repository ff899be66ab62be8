// -------------------------------------------------------------------
// Versioned
// -------------------------------------------------------------------

/// A value whose version moves on every mutable access, so derived
/// data can key on the version instead of comparing contents.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    version: u64,
    data: T,
}

impl<T> Versioned<T> {
    pub fn new(data: T) -> Self {
        Self { version: 0, data }
    }

    pub fn get(&self) -> &T {
        &self.data
    }

    /// Bumps the version even if the caller ends up not changing
    /// anything; at worst that costs one recomputation.
    pub fn get_mut(&mut self) -> &mut T {
        self.version = self.version.wrapping_add(1);
        &mut self.data
    }

    pub fn set(&mut self, data: T) {
        self.data = data;
        self.version = self.version.wrapping_add(1);
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

// -------------------------------------------------------------------
// Memoized
// -------------------------------------------------------------------

type KeyFn<S, K> = Box<dyn Fn(&S) -> K>;
type CalcFn<S, V> = Box<dyn Fn(&S) -> V>;

/// Single-entry cache of a value derived from `S`.
pub struct Memoized<S, K, V> {
    version: u64,
    last: Option<(K, V)>,
    get_key: KeyFn<S, K>,
    calc: CalcFn<S, V>,
}

impl<S, K, V> Memoized<S, K, V>
where
    K: PartialEq,
{
    pub fn new(
        get_key: impl Fn(&S) -> K + 'static,
        calc: impl Fn(&S) -> V + 'static,
    ) -> Self {
        Self {
            version: 0,
            last: None,
            get_key: Box::new(get_key),
            calc: Box::new(calc),
        }
    }

    /// Recompute only if the key changed.
    pub fn get<'a>(&'a mut self, source: &S) -> &'a V {
        let key = (self.get_key)(source);
        if !matches!(&self.last, Some((k, _)) if *k == key) {
            self.last = None;
        }
        let calc = &self.calc;
        let version = &mut self.version;
        &self.last
            .get_or_insert_with(|| {
                *version = version.wrapping_add(1);
                (key, calc(source))
            })
            .1
    }

    /// Incremented each time the value is recomputed.
    pub fn version(&self) -> u64 {
        self.version
    }
}
