use radius_proto::das::{error_cause, sign_das_request, verify_das_response, ErrorCause};
use radius_proto::{Attribute, AttributeType, Code, Packet};
use std::net::UdpSocket;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 4 {
        eprintln!(
            "Usage: {} <disconnect|coa> <username> <secret> [server_addr]",
            args[0]
        );
        eprintln!("Example: {} disconnect alice testing123 127.0.0.1:3799", args[0]);
        std::process::exit(1);
    }

    let code = match args[1].as_str() {
        "disconnect" => Code::DisconnectRequest,
        "coa" => Code::CoaRequest,
        other => {
            eprintln!("Unknown request type: {}", other);
            std::process::exit(1);
        }
    };
    let username = &args[2];
    let secret = args[3].as_bytes();
    let server_addr = args.get(4).map(|s| s.as_str()).unwrap_or("127.0.0.1:3799");

    println!("RADIUS DAS Client Test");
    println!("======================");
    println!("Server: {}", server_addr);
    println!("Request: {:?}", code);
    println!("Username: {}", username);
    println!();

    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.connect(server_addr)?;

    let mut packet = Packet::new(code, 1, [0u8; 16]);
    packet.add_attribute(Attribute::string(AttributeType::UserName as u8, username)?);
    if code == Code::CoaRequest {
        packet.add_attribute(Attribute::integer(AttributeType::SessionTimeout as u8, 3600)?);
    }
    sign_das_request(&mut packet, secret)?;

    let request_data = packet.encode()?;
    println!("Sending {:?} ({} bytes)...", code, request_data.len());
    socket.send(&request_data)?;

    let mut buffer = vec![0u8; 4096];
    socket.set_read_timeout(Some(std::time::Duration::from_secs(5)))?;

    match socket.recv(&mut buffer) {
        Ok(len) => {
            let response = Packet::decode(&buffer[..len])?;
            println!("Received {:?} ({} bytes)", response.code, len);

            match verify_das_response(&response, &packet.authenticator, secret) {
                Ok(()) => println!("  Response Authenticator: valid"),
                Err(e) => println!("  Response Authenticator: INVALID ({})", e),
            }
            if let Some(cause) = error_cause(&response) {
                match ErrorCause::from_u32(cause) {
                    Some(known) => println!("  Error-Cause: {} ({:?})", cause, known),
                    None => println!("  Error-Cause: {}", cause),
                }
            }
        }
        Err(e) => {
            println!("\nNo response received: {}", e);
            println!("  Check the server address, the shared secret and the client address.");
            std::process::exit(1);
        }
    }

    Ok(())
}
