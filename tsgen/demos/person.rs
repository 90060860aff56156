//! Generates declarations, resolvers and a form for a small `Person` model.
//!
//! Run with: `cargo run --example person -- [directive] [output dir]`
//!
//! The directive defaults to `withform(3)`. Without an output directory the
//! generated files are printed.

use std::path::Path;
use tsgen::prelude::*;

const METADATA: &str = r#"<metadata>
    <type name="Gender" namespace="Sample" kind="enum">
        <value name="Unknown" value="0" displayName="Not specified"/>
        <value name="Male" value="1"/>
        <value name="Female" value="2"/>
    </type>
    <type name="Person" namespace="Sample" kind="class">
        <member name="Id" type="int" uiHint="hidden"/>
        <member name="Name" type="string" displayName="Full name" prompt="First and last name">
            <required/>
            <stringLength maximum="50"/>
        </member>
        <member name="Age" type="int?">
            <range minimum="20" maximum="120"/>
        </member>
        <member name="Location" type="string?">
            <stringLength minimum="2" maximum="120"/>
        </member>
        <member name="Email" type="string">
            <emailAddress/>
        </member>
    </type>
    <type name="Employee" namespace="Sample.Staff" kind="class" base="Sample.Person">
        <member name="Gender" type="Sample.Gender">
            <required/>
        </member>
        <member name="Discount" type="double" dataType="Percentage">
            <range minimum="0" maximum="30"/>
        </member>
        <member name="Notes" type="string" uiHint="textarea">
            <uiHintParameter name="colSpan" value="*"/>
        </member>
        <member name="Active" type="bool"/>
    </type>
</metadata>"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let layer: GeneratorLayer = args.next().as_deref().unwrap_or("withform(3)").parse()?;
    let output_dir = args.next();

    println!("Generating Sample.Staff.Employee with {layer}");

    let options = GeneratorOptions::default().with_layer(layer);
    let output = generate_from_xml(METADATA, "Sample.Staff.Employee", &options)?;

    match output_dir {
        Some(dir) => {
            for path in output.write_to_dir(Path::new(&dir))? {
                println!("Wrote {}", path.display());
            }
        }
        None => {
            for (name, file) in &output.files {
                println!("// ---- {} ----", file.file_name(name));
                println!("{}", file.source);
            }
        }
    }

    Ok(())
}
