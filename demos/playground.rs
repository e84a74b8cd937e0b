// Runs the playground example programs and prints their traces
//
// RUST_LOG=tempo_runtime=debug shows every send and receive as it happens.

use futures::future::BoxFuture;
use futures::FutureExt;
use tempo_runtime::{Env, ProcessResult, Simulation, Value};
use tracing_subscriber::EnvFilter;

fn ping_pong(me: &'static str, env: Env, count: i64) -> BoxFuture<'static, anyhow::Result<()>> {
    async move {
        if me == "A" {
            env.send(count, &["B"]).await?;
        } else {
            env.recv("A").await?;
        }
        if count > 0 {
            let next = if me == "A" { "B" } else { "A" };
            ping_pong(next, env.subst(&[("B", "A"), ("A", "B")]), count - 1).await?;
        }
        Ok(())
    }
    .boxed()
}

async fn ping_pong_main(me: &'static str, env: Env) -> ProcessResult {
    ping_pong(me, env.subst(&[("A", "A"), ("B", "B")]), 4).await?;
    Ok(None)
}

fn shift_roles(me: &'static str, env: Env, count: i64) -> BoxFuture<'static, anyhow::Result<()>> {
    async move {
        if count <= 0 {
            return Ok(());
        }
        match me {
            "A" => env.send(count, &["B"]).await?,
            "B" => {
                env.recv("A").await?;
            }
            _ => {}
        }
        let next = match me {
            "A" => "D",
            "B" => "A",
            "C" => "B",
            _ => "C",
        };
        let shifted = env.subst(&[("B", "A"), ("C", "B"), ("D", "C"), ("A", "D")]);
        shift_roles(next, shifted, count - 1).await
    }
    .boxed()
}

async fn shift_roles_main(me: &'static str, env: Env) -> ProcessResult {
    shift_roles(me, env, 4).await?;
    Ok(None)
}

fn transitive_send() -> Simulation {
    Simulation::default()
        .role("A", |env| async move {
            env.send(10, &["B"]).await?;
            Ok(Some(Value::Int(10)))
        })
        .role("B", |env| async move {
            let y = env.recv("A").await?;
            env.send(y.clone(), &["C"]).await?;
            Ok(Some(y))
        })
        .role("C", |env| async move { Ok(Some(env.recv("B").await?)) })
}

fn distributed_pair() -> Simulation {
    Simulation::default()
        .role("A", |env| async move {
            let number = env.recv("B");
            env.send("hello", &["B"]).await?;
            Ok(Some(Value::structure("Pair", [("x", number.await?)])))
        })
        .role("B", |env| async move {
            env.send(10, &["A"]).await?;
            let text = env.recv("A").await?;
            Ok(Some(Value::structure("Pair", [("y", text)])))
        })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let programs = [
        (
            "Ping Pong",
            Simulation::default()
                .role("A", |env| ping_pong_main("A", env))
                .role("B", |env| ping_pong_main("B", env)),
        ),
        (
            "Shift Roles",
            ["A", "B", "C", "D"]
                .into_iter()
                .fold(Simulation::default(), |sim, role| {
                    sim.role(role, move |env| shift_roles_main(role, env))
                }),
        ),
        ("Transitive Send", transitive_send()),
        ("Distributed Pair", distributed_pair()),
    ];

    for (name, simulation) in programs {
        println!("=== {name} ===");
        let trace = simulation.run().await?;
        print!("{trace}");
        println!();
    }
    Ok(())
}
