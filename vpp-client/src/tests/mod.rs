#![cfg(test)]

mod config;
mod mock;
mod sequencer;
