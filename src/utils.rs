macro_rules! cfg_async_std {
    ($($item:item)*) => {
        $(
            #[cfg(feature = "use-async-std")]
            $item
        )*
    }
}

// Tokio is the default runtime only when async-std is not enabled.
macro_rules! cfg_tokio_only {
    ($($item:item)*) => {
        $(
            #[cfg(all(feature = "use-tokio", not( feature = "use-async-std" ) ))]
            $item
        )*
    }
}

macro_rules! cfg_tokio {
    ($($item:item)*) => {
        $(
            #[cfg(feature = "use-tokio")]
            $item
        )*
    }
}

macro_rules! cfg_any_spawner {
    ($($item:item)*) => {
        $(
            #[cfg(any(feature = "use-async-std", feature = "use-tokio"))]
            $item
        )*
    }
}
