//! Every operation owns one error kind and wraps whatever it caught.
//!
//! Run with `cargo run --example operation_chain`.

use provenance_errors::{
    Cause, ExpectedLevel, Result, check_chain, context, create_error, define_errors,
};
use std::io;

define_errors! {
    "BILLING" as BILLING_ERRORS => {
        LEDGER_READ_FAILED = ("Could not read ledger {ledger}", true, ["ledger"]),
        INVOICE_TOTAL_FAILED = ("Could not total invoice {invoice}", true, ["invoice"]),
        INVOICE_SEND_FAILED = ("Could not send invoice {invoice} to {customer}", false, ["invoice", "customer"]),
    }
}

fn read_ledger(ledger: &str) -> Result<Vec<u64>> {
    let io = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied (os error 13)");
    Err(create_error(
        &LEDGER_READ_FAILED,
        context! { "ledger" => ledger },
        Some(Cause::foreign(io)),
    ))
}

fn total_invoice(invoice: u32) -> Result<u64> {
    let lines = read_ledger("2026-q3").map_err(|e| {
        create_error(&INVOICE_TOTAL_FAILED, context! { "invoice" => invoice }, Some(e.into()))
    })?;
    Ok(lines.iter().sum())
}

fn send_invoice(invoice: u32, customer: &str) -> Result<()> {
    let total = total_invoice(invoice).map_err(|e| {
        create_error(
            &INVOICE_SEND_FAILED,
            context! { "invoice" => invoice, "customer" => customer },
            Some(e.into()),
        )
    })?;
    println!("sent invoice {invoice} for {total}");
    Ok(())
}

fn main() {
    let Err(err) = send_invoice(1042, "ACME Corp") else {
        return;
    };

    println!("--- format(): top level and its direct cause ---");
    println!("{}\n", err.format());

    println!("--- chain walk ---");
    for (level, link) in err.chain().enumerate() {
        println!(
            "  {level}: {} [{}] {}",
            link.type_name(),
            link.code().unwrap_or("-"),
            link.message()
        );
    }
    println!("  root cause: {}\n", err.root_cause().message());

    println!("--- to_json(): every level ---");
    match serde_json::to_string_pretty(&err.to_json()) {
        Ok(json) => println!("{json}\n"),
        Err(e) => println!("serialization failed: {e}\n"),
    }

    let expected = [
        ExpectedLevel::code("INVOICE_SEND_FAILED").with_message("acme"),
        ExpectedLevel::code("INVOICE_TOTAL_FAILED"),
        ExpectedLevel::code("LEDGER_READ_FAILED"),
        ExpectedLevel::type_name("Error").with_message("permission denied"),
    ];
    match check_chain(&err, &expected) {
        Ok(()) => println!("chain matches the expected {} levels", expected.len()),
        Err(mismatch) => println!("chain mismatch: {mismatch}"),
    }

    match check_chain(&err, &expected[..2]) {
        Ok(()) => println!("unexpected match"),
        Err(mismatch) => println!("shortened expectation rejected: {mismatch}"),
    }
}
