mod tmem;
mod types;
