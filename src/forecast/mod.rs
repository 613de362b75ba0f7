pub mod conditions;
pub mod daily;
pub mod gateway;
pub mod openweather;
pub mod types;

#[cfg(test)]
pub mod mock;
