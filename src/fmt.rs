//! Logging shim
//!
//! Routes diagnostics to `defmt` on target builds and to the `log` facade on
//! host builds. With neither backend the macros expand to nothing but still
//! borrow their arguments.

#![allow(unused_macros)]

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "embedded")]
            ::defmt::trace!($s $(, $x)*);
            #[cfg(all(feature = "std", not(feature = "embedded")))]
            ::log::trace!($s $(, $x)*);
            #[cfg(not(any(feature = "embedded", feature = "std")))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "embedded")]
            ::defmt::debug!($s $(, $x)*);
            #[cfg(all(feature = "std", not(feature = "embedded")))]
            ::log::debug!($s $(, $x)*);
            #[cfg(not(any(feature = "embedded", feature = "std")))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "embedded")]
            ::defmt::info!($s $(, $x)*);
            #[cfg(all(feature = "std", not(feature = "embedded")))]
            ::log::info!($s $(, $x)*);
            #[cfg(not(any(feature = "embedded", feature = "std")))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "embedded")]
            ::defmt::warn!($s $(, $x)*);
            #[cfg(all(feature = "std", not(feature = "embedded")))]
            ::log::warn!($s $(, $x)*);
            #[cfg(not(any(feature = "embedded", feature = "std")))]
            let _ = ($( & $x ),*);
        }
    };
}

macro_rules! error {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "embedded")]
            ::defmt::error!($s $(, $x)*);
            #[cfg(all(feature = "std", not(feature = "embedded")))]
            ::log::error!($s $(, $x)*);
            #[cfg(not(any(feature = "embedded", feature = "std")))]
            let _ = ($( & $x ),*);
        }
    };
}
