/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Main executable for hubbard-rs

use clap::Parser;
use hubbard_rs::cli::{self, Args};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    println!("hubbard-rs v{}", hubbard_rs::VERSION);
    println!("Mean-field Hubbard model for pi-conjugated structures");
    println!("-----------------------------------------------------------");

    cli::run(&args)
}
