use rand::RngCore;
use std::{
    fs::File,
    io::{ErrorKind, Write},
};

const KEY_LEN: usize = 16;

fn main() {
    // Linker scripts only exist for the bare-metal targets
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("none") {
        println!("cargo:rustc-link-arg-bins=-Tlinkall.x");
        println!("cargo:rustc-link-arg-bins=-Trom_functions.x");
    }
    println!("cargo::rerun-if-changed=build.rs");

    std::fs::create_dir_all("keys").expect("Unable to create keys directory");

    // Primary key shared by every node of the demo network
    generate_key("keys/primary_key.dat");

    // Link key installed on each encrypted peer
    generate_key("keys/link_key.dat");
}

fn generate_key(path: &str) {
    println!("cargo::rerun-if-changed={path}");
    match File::create_new(path) {
        Ok(mut file) => {
            let mut key = [0u8; KEY_LEN];
            let mut rng = rand::thread_rng();
            rng.fill_bytes(&mut key);

            file.write_all(&key)
                .unwrap_or_else(|err| panic!("Unable to write {path}: {err:?}"));
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
        Err(err) => panic!("{err:?}"),
    }
}
