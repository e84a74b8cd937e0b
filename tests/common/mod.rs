//! Per-role projections of the playground programs, written the way the
//! compiler emits them: one function per static role, with calls to other
//! choreographic functions going through `Env::subst`.

#![allow(dead_code)]

use async_recursion::async_recursion;
use tempo_runtime::{Env, ProcessResult, Simulation, Value};

/// ```text
/// func@(A,B) pingPong(count: Int@[A,B]) {
///   await A->B count;
///   if count > 0 { pingPong@(B,A)(count - 1); }
/// }
/// ```
#[async_recursion]
pub async fn ping_pong(me: &'static str, env: Env, count: i64) -> anyhow::Result<()> {
    if me == "A" {
        env.send(count, &["B"]).await?;
    } else {
        env.recv("A").await?;
    }
    if count > 0 {
        let swapped = env.subst(&[("B", "A"), ("A", "B")]);
        let next = if me == "A" { "B" } else { "A" };
        ping_pong(next, swapped, count - 1).await?;
    }
    Ok(())
}

/// `func@(A,B) main() { pingPong@(A,B)(count); }`
async fn ping_pong_main(me: &'static str, env: Env, count: i64) -> ProcessResult {
    ping_pong(me, env.subst(&[("A", "A"), ("B", "B")]), count).await?;
    Ok(None)
}

pub fn ping_pong_simulation(count: i64) -> Simulation {
    Simulation::default()
        .role("A", move |env| ping_pong_main("A", env, count))
        .role("B", move |env| ping_pong_main("B", env, count))
}

/// ```text
/// func@(A,B,C,D) shiftRoles(count: Int@[A,B,C,D]) {
///   if count > 0 {
///     await A->B count;
///     shiftRoles@(B,C,D,A)(count - 1);
///   }
/// }
/// ```
#[async_recursion]
pub async fn shift_roles(me: &'static str, env: Env, count: i64) -> anyhow::Result<()> {
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
    // The caller's B plays the callee's A, C plays B, and so on.
    let shifted = env.subst(&[("B", "A"), ("C", "B"), ("D", "C"), ("A", "D")]);
    let next = match me {
        "A" => "D",
        "B" => "A",
        "C" => "B",
        _ => "C",
    };
    shift_roles(next, shifted, count - 1).await
}

/// `func@(A,B,C,D) main() { shiftRoles@(A,B,C,D)(count); }`
async fn shift_roles_main(me: &'static str, env: Env, count: i64) -> ProcessResult {
    let env = env.subst(&[("A", "A"), ("B", "B"), ("C", "C"), ("D", "D")]);
    shift_roles(me, env, count).await?;
    Ok(None)
}

pub fn shift_roles_simulation(count: i64) -> Simulation {
    ["A", "B", "C", "D"].into_iter().fold(Simulation::default(), |sim, role| {
        sim.role(role, move |env| shift_roles_main(role, env, count))
    })
}

/// ```text
/// func@(A,B,C) main() Int@[A,B,C] {
///   let x: Int@A = 10;
///   let y: Int@[A,B] = await A->B x;
///   let z: Int@[A,B,C] = await B->C y;
///   return z;
/// }
/// ```
pub fn transitive_send_simulation() -> Simulation {
    Simulation::default()
        .role("A", |env| async move {
            let x = 10;
            env.send(x, &["B"]).await?;
            Ok(Some(Value::Int(x)))
        })
        .role("B", |env| async move {
            let y: i64 = env.recv_as("A").await?;
            env.send(y, &["C"]).await?;
            Ok(Some(Value::Int(y)))
        })
        .role("C", |env| async move {
            let z: i64 = env.recv_as("B").await?;
            Ok(Some(Value::Int(z)))
        })
}

/// ```text
/// func@(X,Y) incAndSend(value: Int@X) Int@Y {
///   return await X->Y (value+1);
/// }
/// ```
pub async fn inc_and_send(me: &'static str, env: Env, value: Option<i64>) -> anyhow::Result<Option<i64>> {
    match me {
        "X" => {
            env.send(value.unwrap_or_default() + 1, &["Y"]).await?;
            Ok(None)
        }
        "Y" => Ok(Some(env.recv_as("X").await?)),
        _ => Ok(None),
    }
}

/// Static role of a concrete `main` role inside `incAndSend@(first, second)`.
fn inc_role(me: &'static str, first: &str, second: &str) -> &'static str {
    if me == first {
        "X"
    } else if me == second {
        "Y"
    } else {
        "_"
    }
}

/// ```text
/// func@(A,B,C) compose(f: func@(A,B)(Int@A)Int@B, g: func@(B,C)(Int@B)Int@C)
///     func@(A,B,C)(Int@A)Int@C {
///   return func@(A,B,C) (input: Int@A) Int@C { return g(f(input)); };
/// }
///
/// func@(A,B,C) main() Int@C {
///   let f = incAndSend@(A,B);
///   let g = incAndSend@(B,C);
///   let c = compose@(A,B,C)(f, g);
///   return c(10@A);
/// }
/// ```
///
/// Function values capture the environment they were created in, so `f`
/// and `g` resolve through `main`'s table even when invoked from inside
/// `compose`.
async fn compose_main(me: &'static str, env: Env) -> ProcessResult {
    let f_env = env.subst(&[("A", "X"), ("B", "Y")]);
    let g_env = env.subst(&[("B", "X"), ("C", "Y")]);
    let f = move |input| inc_and_send(inc_role(me, "A", "B"), f_env, input);
    let g = move |input| inc_and_send(inc_role(me, "B", "C"), g_env, input);

    // compose@(A,B,C)(f, g) only chains the two function values.
    let c = move |input| async move { g(f(input).await?).await };

    let input = (me == "A").then_some(10);
    let result = c(input).await?;
    Ok(result.map(Value::Int))
}

pub fn compose_simulation() -> Simulation {
    ["A", "B", "C"].into_iter().fold(Simulation::default(), |sim, role| {
        sim.role(role, move |env| compose_main(role, env))
    })
}

/// ```text
/// func@(A,B) main() Pair@(A,B) {
///   let number: async Int@A = B->A 10;
///   let text: async String@B = A->B "hello";
///   return Pair@(A,B) { x: await number, y: await text };
/// }
/// ```
pub fn distributed_pair_simulation() -> Simulation {
    Simulation::default()
        .role("A", |env| async move {
            let number = env.recv_as::<i64>("B");
            env.send("hello", &["B"]).await?;
            let x = number.await?;
            Ok(Some(Value::structure("Pair", [("x", Value::Int(x))])))
        })
        .role("B", |env| async move {
            env.send(10, &["A"]).await?;
            let y: String = env.recv_as("A").await?;
            Ok(Some(Value::structure("Pair", [("y", Value::Str(y))])))
        })
}

pub fn com(sender: &str, receivers: &[&str], value: impl Into<Value>) -> tempo_runtime::Event {
    tempo_runtime::Event::Com {
        sender: sender.into(),
        receivers: receivers.iter().map(|r| (*r).into()).collect(),
        value: value.into(),
    }
}
