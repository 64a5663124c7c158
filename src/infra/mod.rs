pub mod baseride;
