use std::{cmp::Ordering, fmt, marker::PhantomData, ops::Add};

pub trait DistanceUnit: Copy {
    const NAME: &'static str;
    const METERS_IN_UNIT: f64;
}

/// A distance tagged with its unit. Unlike a plain `f64`, mixing units
/// requires an explicit [`Distance::to`] conversion.
///
/// The value may be positive infinity, which is what the distance to an empty
/// path evaluates to.
#[derive(Debug, Clone, Copy)]
pub struct Distance<T: DistanceUnit> {
    value: f64,
    unit: PhantomData<T>,
}

macro_rules! create_distance_unit {
    ($struct_name:ident, $string_name:expr, $meters_in_unit:expr) => {
        #[derive(Debug, Copy, Clone, Eq, PartialEq)]
        pub struct $struct_name;

        impl DistanceUnit for $struct_name {
            const NAME: &'static str = $string_name;
            const METERS_IN_UNIT: f64 = $meters_in_unit;
        }
    };
}

create_distance_unit!(Meters, "meter", 1.0);
create_distance_unit!(Kilometers, "kilometer", 1_000.0);
create_distance_unit!(Miles, "mile", 1_609.344);

impl<T> Distance<T>
where
    T: DistanceUnit,
{
    pub const ZERO: Distance<T> = Distance::new(0.0);
    pub const INFINITY: Distance<T> = Distance::new(f64::INFINITY);

    pub const fn new(value: f64) -> Distance<T> {
        Distance {
            value,
            unit: PhantomData,
        }
    }

    #[inline(always)]
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_finite(&self) -> bool {
        self.value.is_finite()
    }

    pub fn to<U: DistanceUnit>(self) -> Distance<U> {
        Distance::new(self.value * T::METERS_IN_UNIT / U::METERS_IN_UNIT)
    }

    pub fn min(self, other: Distance<T>) -> Distance<T> {
        if other.value < self.value { other } else { self }
    }

    fn meters(&self) -> f64 {
        self.value * T::METERS_IN_UNIT
    }
}

impl<T> From<Distance<T>> for f64
where
    T: DistanceUnit,
{
    fn from(value: Distance<T>) -> Self {
        value.value
    }
}

impl<T> From<f64> for Distance<T>
where
    T: DistanceUnit,
{
    fn from(value: f64) -> Self {
        Distance::new(value)
    }
}

impl<T> fmt::Display for Distance<T>
where
    T: DistanceUnit,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {}{}",
            self.value,
            T::NAME,
            if self.value == 1_f64 { "" } else { "s" }
        )
    }
}

impl<T1, T2> PartialEq<Distance<T2>> for Distance<T1>
where
    T1: DistanceUnit,
    T2: DistanceUnit,
{
    fn eq(&self, other: &Distance<T2>) -> bool {
        self.meters() == other.meters()
    }
}

// compares lengths across units through meters
impl<T1, T2> PartialOrd<Distance<T2>> for Distance<T1>
where
    T1: DistanceUnit,
    T2: DistanceUnit,
{
    fn partial_cmp(&self, other: &Distance<T2>) -> Option<Ordering> {
        self.meters().partial_cmp(&other.meters())
    }
}

impl<T> Add<Distance<T>> for Distance<T>
where
    T: DistanceUnit,
{
    type Output = Distance<T>;

    fn add(self, other: Distance<T>) -> Distance<T> {
        Distance::new(self.value + other.value)
    }
}

macro_rules! miles {
    ($num:expr) => {
        crate::distance::Distance::<crate::distance::Miles>::new($num)
    };
}

pub(crate) use miles;
