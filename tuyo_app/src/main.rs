//! Terminal front end for the TUYO gateways: login, card listing, the
//! OTP-guarded wizards (password recovery, card registration, card
//! deletion), recharge checkout links and the live arrivals board.

use std::{
    env, fs, process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{bail, Context, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::Notify,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tuyo_api::{
    payment::{pesos_to_cents, CheckoutForm},
    polling::Render,
    session::{decode_claims, TokenClaims},
    strength::{evaluate_strength, strength_label},
    validation::format_card_number,
    wizard::{Control, Payload, Phase, WizardShell},
    AuthApi, CardsApi, PollingView, TuyoClient, TuyoConfig, Wizard, WizardConfig,
};

/// Line-oriented stdin reader.
struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one trimmed line. `None` on EOF.
    async fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        println!("{label}: ");
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_string()))
    }
}

/// What the logged-in page knows about the user.
struct App {
    client: TuyoClient,
    config: TuyoConfig,
    claims: Option<TokenClaims>,
}

impl App {
    fn require_login(&self) -> Option<&TokenClaims> {
        if self.claims.is_none() {
            println!("Primero inicia sesión con `login <correo>`.");
        }
        self.claims.as_ref()
    }

    async fn show_cards(&self) {
        let Some(claims) = self.require_login() else {
            return;
        };
        match self.client.list_cards(claims.user_id).await {
            Ok(cards) if cards.is_empty() => println!("No tienes tarjetas registradas."),
            Ok(cards) => {
                for card in cards {
                    println!(
                        "  [{}] {}  saldo: ${:.0}  {}",
                        card.id,
                        card.numero,
                        card.saldo,
                        card.estado.unwrap_or_default()
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load cards");
                println!("No se pudieron cargar tus tarjetas.");
            }
        }
    }

    /// Drive a wizard until it finishes or the user cancels. Returns whether
    /// the success callback fired.
    async fn run_wizard(&self, console: &mut Console, wizard: Wizard<TuyoClient>) -> Result<bool> {
        if let Some(claims) = &self.claims {
            wizard.set_target(&claims.correo).await?;
        }

        let succeeded = Arc::new(AtomicBool::new(false));
        let closed = Arc::new(Notify::new());
        let shell = WizardShell::new(
            wizard,
            self.config.done_delay,
            {
                let succeeded = succeeded.clone();
                Arc::new(move || succeeded.store(true, Ordering::SeqCst))
            },
            {
                let closed = closed.clone();
                Arc::new(move || closed.notify_one())
            },
        );

        println!("(escribe `cancelar` en cualquier paso para salir)");
        loop {
            let view = shell.render().await;
            match view.control {
                Control::Success { message } => {
                    println!("✓ {message}");
                    closed.notified().await;
                    break;
                }
                Control::EmailInput { value } => {
                    let label = if value.is_empty() {
                        "Correo electrónico".to_string()
                    } else {
                        format!("Correo electrónico [{value}]")
                    };
                    let Some(line) = console.prompt(&label).await? else {
                        shell.close();
                        break;
                    };
                    if line == "cancelar" {
                        shell.close();
                        break;
                    }
                    if !line.is_empty() {
                        shell.wizard().set_target(&line).await?;
                    }
                }
                Control::OtpBoxes { total, .. } => {
                    let label = format!("Código de {total} dígitos (`<` para corregir el correo)");
                    let Some(line) = console.prompt(&label).await? else {
                        shell.close();
                        break;
                    };
                    match line.as_str() {
                        "cancelar" => {
                            shell.close();
                            break;
                        }
                        "<" => {
                            shell.back().await?;
                            continue;
                        }
                        code => shell.wizard().set_otp(code).await?,
                    }
                }
                Control::NewPassword { .. } => {
                    let Some(nueva) = console.prompt("Nueva contraseña").await? else {
                        shell.close();
                        break;
                    };
                    if nueva == "cancelar" {
                        shell.close();
                        break;
                    }
                    let score = evaluate_strength(&nueva);
                    println!("  Seguridad: {} ({score}/5)", strength_label(score));
                    let confirmar = console.prompt("Confirma la contraseña").await?.unwrap_or_default();
                    shell
                        .wizard()
                        .set_payload(Payload::NewPassword { nueva, confirmar })
                        .await?;
                }
                Control::CardNumber { .. } => {
                    let Some(raw) = console.prompt("Número de tarjeta (16 dígitos)").await? else {
                        shell.close();
                        break;
                    };
                    if raw == "cancelar" {
                        shell.close();
                        break;
                    }
                    let numero = format_card_number(&raw);
                    shell.wizard().set_payload(Payload::CardNumber(numero)).await?;
                }
                Control::DeleteConfirmation { total, .. } => {
                    let Some(code) = console.prompt(&format!("Código de {total} dígitos")).await? else {
                        shell.close();
                        break;
                    };
                    if code == "cancelar" {
                        shell.close();
                        break;
                    }
                    shell.wizard().set_otp(&code).await?;
                    let answer = console
                        .prompt("¿Seguro que deseas eliminar la tarjeta? (s/n)")
                        .await?
                        .unwrap_or_default();
                    let confirmed = matches!(answer.to_lowercase().as_str(), "s" | "si" | "sí");
                    shell
                        .wizard()
                        .set_payload(Payload::DeleteConfirmation(confirmed))
                        .await?;
                }
            }

            match shell.submit().await {
                Ok(Phase::CollectOtp) => println!("Te enviamos un código a tu correo."),
                Ok(_) => {}
                Err(e) => println!("  ! {e}"),
            }
        }

        Ok(succeeded.load(Ordering::SeqCst))
    }

    async fn show_arrivals(&self, console: &mut Console, filter: &str) -> Result<()> {
        let view = PollingView::mount(self.client.clone(), self.config.poll_interval);
        view.set_filter(filter).await;
        println!("Actualizando cada {:?}. Escribe un filtro, o `q` para volver.", self.config.poll_interval);

        let mut changes = view.changes();
        print_arrivals(&view.render().await);
        loop {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    print_arrivals(&view.render().await);
                    let failures = view.consecutive_failures().await;
                    if failures >= 3 {
                        println!("  (sin conexión con el simulador; mostrando los últimos datos)");
                    }
                }
                line = console.lines.next_line() => {
                    match line? {
                        None => break,
                        Some(q) if q.trim() == "q" => break,
                        Some(q) => {
                            view.set_filter(&q).await;
                            print_arrivals(&view.render().await);
                        }
                    }
                }
            }
        }

        view.unmount();
        Ok(())
    }

    fn recharge_link(&self, tarjeta_id: i64, pesos: u64) -> Result<String> {
        let Some(checkout) = &self.config.checkout else {
            bail!("no hay pasarela de pago configurada");
        };
        let form = CheckoutForm::new(checkout, tarjeta_id, pesos_to_cents(pesos)?)?;
        Ok(form.redirect_url()?)
    }
}

fn print_arrivals(render: &Render<tuyo_api::StationArrivals>) {
    match render {
        Render::Loading => println!("Cargando llegadas..."),
        Render::Ready(stations) if stations.is_empty() => println!("Sin estaciones para ese filtro."),
        Render::Ready(stations) => {
            for station in stations {
                println!("{} ({})", station.name, station.id);
                for bus in &station.buses {
                    println!("    {:<6} {} min", bus.route, bus.eta_minutes);
                }
            }
        }
    }
}

/// The main entry point of the app
#[tokio::main]
async fn main() -> Result<()> {
    let args = env::args().skip(1).collect::<Vec<String>>();

    // Show help and exit if requested.
    if args.iter().any(|a| a == "--help") {
        print_help();
        process::exit(0);
    }

    // Show version and exit if requested.
    if args.iter().any(|a| a == "--version") {
        println!("tuyo {}", env!("CARGO_PKG_VERSION"));
        process::exit(0);
    }

    let mut env_file: Option<String> = None;
    let mut token: Option<String> = None;
    let mut verbose = false;
    let mut config_file: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--env-file" | "-e" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("[ERROR] --env-file requires a file name.");
                    process::exit(1);
                }
                env_file = Some(args[i].clone());
            }
            "--token" | "-t" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("[ERROR] --token requires a token string.");
                    process::exit(1);
                }
                token = Some(args[i].clone());
            }
            "--verbose" | "-v" => {
                verbose = true;
            }
            val => {
                if let Some(existing) = &config_file {
                    eprintln!(
                        "[WARNING] Multiple config files specified. Using '{existing}' and ignoring '{val}'."
                    );
                } else {
                    config_file = Some(val.to_string());
                }
            }
        }
        i += 1;
    }

    // Load the env file before anything reads the environment.
    if let Some(env_path) = &env_file {
        dotenvy::from_filename(env_path)
            .with_context(|| format!("failed to load env file '{env_path}'"))?;
    }

    let default_filter = if verbose {
        "tuyo_app=debug,tuyo_api=debug"
    } else {
        "tuyo_app=info,tuyo_api=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &config_file {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{path}'"))?;
            let parsed: TuyoConfig = serde_json::from_str(&data)
                .with_context(|| format!("invalid JSON config in '{path}'"))?;
            parsed.validate()?;
            parsed
        }
        None => TuyoConfig::from_env()?,
    };
    tracing::info!(?config, "loaded configuration");

    let client = TuyoClient::from_config(&config)?;

    let token = token.or_else(|| env::var("TUYO_TOKEN").ok());
    let claims = match token {
        Some(tk) => {
            let claims = decode_claims(&tk).context("the provided token is not readable")?;
            if claims.is_expired() {
                bail!("the provided token has expired; log in again");
            }
            client.set_token(Some(tk)).await;
            Some(claims)
        }
        None => None,
    };

    let mut app = App {
        client,
        config,
        claims,
    };
    let mut console = Console::new();

    match &app.claims {
        Some(c) => println!("Hola, {}.", c.display_name()),
        None => println!("Bienvenido a TUYO. Escribe `ayuda` para ver los comandos."),
    }

    loop {
        let Some(line) = console.prompt("tuyo>").await? else {
            break;
        };
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();

        match command {
            "" => {}
            "ayuda" | "help" => print_commands(),
            "salir" | "exit" => break,
            "login" => {
                let Some(correo) = rest.first().map(|s| s.to_string()) else {
                    println!("Uso: login <correo>");
                    continue;
                };
                let contrasenia = console.prompt("Contraseña").await?.unwrap_or_default();
                match app.client.login(&correo, &contrasenia).await {
                    Ok(claims) => {
                        println!("Hola, {}.", claims.display_name());
                        app.claims = Some(claims);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "login failed");
                        println!(
                            "  ! {}",
                            e.server_message().unwrap_or("Correo o contraseña incorrectos")
                        );
                    }
                }
            }
            "logout" => {
                app.client.logout().await;
                app.claims = None;
                println!("Sesión cerrada.");
            }
            "tarjetas" => app.show_cards().await,
            "recuperar" => {
                let config = WizardConfig::password_recovery(app.client.clone());
                let wizard = Wizard::new(app.client.clone(), config);
                if app.run_wizard(&mut console, wizard).await? {
                    println!("Ya puedes iniciar sesión con tu nueva contraseña.");
                }
            }
            "registrar" => {
                let Some(cuenta_id) = app.require_login().map(|c| c.user_id) else {
                    continue;
                };
                let config = WizardConfig::card_registration(app.client.clone(), cuenta_id);
                let wizard = Wizard::new(app.client.clone(), config);
                if app.run_wizard(&mut console, wizard).await? {
                    app.show_cards().await;
                }
            }
            "eliminar" => {
                if app.require_login().is_none() {
                    continue;
                }
                let Some(tarjeta_id) = rest.first().and_then(|s| s.parse::<i64>().ok()) else {
                    println!("Uso: eliminar <idtarjeta>");
                    continue;
                };
                let config = WizardConfig::card_deletion(app.client.clone(), tarjeta_id);
                let wizard = Wizard::new(app.client.clone(), config);
                if app.run_wizard(&mut console, wizard).await? {
                    app.show_cards().await;
                }
            }
            "recargar" => {
                let parsed = (
                    rest.first().and_then(|s| s.parse::<i64>().ok()),
                    rest.get(1).and_then(|s| s.parse::<u64>().ok()),
                );
                let (Some(tarjeta_id), Some(pesos)) = parsed else {
                    println!("Uso: recargar <idtarjeta> <monto en pesos>");
                    continue;
                };
                match app.recharge_link(tarjeta_id, pesos) {
                    Ok(url) => println!("Completa el pago en:\n  {url}"),
                    Err(e) => println!("  ! {e}"),
                }
            }
            "llegadas" => {
                let filter = rest.join(" ");
                app.show_arrivals(&mut console, &filter).await?;
            }
            other => println!("Comando desconocido: {other}. Escribe `ayuda`."),
        }
    }

    Ok(())
}

fn print_commands() {
    println!(
        r#"Comandos:
  login <correo>             Iniciar sesión
  logout                     Cerrar sesión
  tarjetas                   Ver tus tarjetas y su saldo
  registrar                  Registrar una tarjeta (requiere código por correo)
  eliminar <idtarjeta>       Eliminar una tarjeta (requiere código por correo)
  recargar <idtarjeta> <$>   Obtener el enlace de pago para recargar
  recuperar                  Recuperar tu contraseña
  llegadas [filtro]          Ver llegadas de buses en tiempo real
  salir                      Salir"#
    );
}

/// Print help text and usage examples
fn print_help() {
    println!(
        r#"Usage: tuyo [OPTION]... [CONFIG_FILE]
Interactive client for the TUYO transit services.

CONFIG_FILE is an optional JSON file with service endpoints and timings.
Without it, settings are read from TUYO_* environment variables.

Options:
  -e, --env-file [FILE]        Load environment variables from a .env file.
  -t, --token [TOKEN]          Start with an existing session token (or set TUYO_TOKEN).
  -v, --verbose                Debug-level logging (overridden by RUST_LOG).
      --help                   Display this help and exit.
      --version                Output version information and exit.

Examples:
  tuyo -e .env
  tuyo -t eyJhbGciOi... config.json
"#
    );
}
