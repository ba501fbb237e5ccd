//! Entry shell: argument parsing, peer-id generation, and
//! one-shot file output. Everything that matters lives in the library;
//! this binary just wires it up and turns any error into an exit code.

use std::process;

use rand::RngCore;

use soltorrent::conf::Conf;
use soltorrent::descriptor::Descriptor;
use soltorrent::metainfo::Metainfo;
use soltorrent::{coordinator, tracker};

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <input.torrent> <output.file>", args.get(0).map(String::as_str).unwrap_or("soltorrent"));
        process::exit(1);
    }

    if let Err(e) = run(&args[1], &args[2]).await {
        eprintln!("{}", e);
        process::exit(1);
    }
}

async fn run(input_path: &str, output_path: &str) -> soltorrent::error::Result<()> {
    let bytes = std::fs::read(input_path)?;
    let metainfo = Metainfo::from_bytes(&bytes)
        .map_err(|e| soltorrent::error::Error::DescriptorInvalid(e.to_string()))?;
    let descriptor = Descriptor::from_metainfo(&metainfo)?;

    let mut conf = Conf::default();
    rand::thread_rng().fill_bytes(&mut conf.client_id);

    let peers = tracker::announce(
        &descriptor.announce_url,
        descriptor.info_hash,
        conf.client_id,
        conf.port,
        descriptor.total_length,
    )
    .await?;

    let bytes = coordinator::download(&descriptor, peers, conf.client_id, conf).await?;

    std::fs::write(output_path, &bytes)?;
    Ok(())
}
