pub mod daily_sweep;
