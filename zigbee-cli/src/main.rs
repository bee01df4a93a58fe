use log::info;

struct Args {
    port: String,
    controller: String,
    permit_join: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut port = None;
    let mut controller = None;
    let mut permit_join = false;

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--port" => {
                port = Some(iter.next().ok_or("--port requires a value")?);
            }
            "--controller" => {
                controller = Some(iter.next().ok_or("--controller requires a value")?);
            }
            "--permitJoin" => permit_join = true,
            other => return Err(format!("unrecognized argument: {other}")),
        }
    }

    Ok(Args {
        port: port.ok_or("--port is required")?,
        controller: controller.ok_or("--controller is required")?,
        permit_join,
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    zigbee_znp::controller::register();
    zigbee_conbee::controller::register();

    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("usage: zigbee-cli --port <device> --controller {{znp,conbee}} [--permitJoin]");
            std::process::exit(1);
        }
    };

    let rts_cts = args.controller == "znp";
    let transport = match zigbee_core::transport::serial::open_port(&args.port, rts_cts) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("failed to open {}: {e}", args.port);
            std::process::exit(1);
        }
    };

    info!("bringing up {} controller on {}", args.controller, args.port);
    let controller = match zigbee_core::controller::new_controller(&args.controller, Box::new(transport)) {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("bring-up failed: {e}");
            std::process::exit(1);
        }
    };
    println!("{} controller ready on {}", args.controller, args.port);

    if args.permit_join {
        match controller.permit_join(60) {
            Ok(()) => println!("permit-join enabled"),
            Err(e) => eprintln!("failed to enable permit-join: {e}"),
        }
    }

    let incoming = match controller.incoming() {
        Ok(rx) => rx,
        Err(e) => {
            eprintln!("failed to subscribe to incoming messages: {e}");
            std::process::exit(1);
        }
    };

    for message in incoming {
        println!(
            "{} -> {} ep{}/{} profile={} cluster={:#06x} lqi={} {} byte(s): {:02x?}",
            message.source,
            message.destination,
            message.source_endpoint,
            message.destination_endpoint,
            message.profile_id,
            message.cluster_id,
            message.link_quality,
            message.data.len(),
            message.data,
        );
    }

    info!("incoming channel closed, exiting");
}
