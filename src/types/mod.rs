pub mod city;
pub mod features;
pub mod prediction;
pub mod weather_variable;
