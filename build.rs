fn main() -> std::io::Result<()> {
    use std::io::Write;

    let out_dir = std::env::var_os("OUT_DIR").unwrap();
    let path = std::path::Path::new(&out_dir).join("num.rs");
    let file = std::fs::File::create(path)?;

    writeln!(&file, "pub type P0<T = Z> = T;")?;
    for i in 1..=64 {
        writeln!(&file, "pub type P{}<T = Z> = S<P{}<T>>;", i, i - 1)?;
    }

    let path = std::path::Path::new(&out_dir).join("aliases.rs");
    let file = std::fs::File::create(path)?;

    let letters: Vec<char> = ('A'..='Z').collect();

    for i in 2..=8 {
        write!(
            &file,
            "\
/// A variant over {0} alternatives
pub type Variant{0}<",
            i
        )?;
        for letter in &letters[..i] {
            writeln!(&file, "{},", letter)?;
        }
        write!(&file, "Pol = policy::LetVariantDecide> = Variant<tlist!(")?;
        for letter in &letters[..i] {
            writeln!(&file, "{},", letter)?;
        }
        writeln!(&file, "), Pol>;")?;
    }

    println!("cargo:rerun-if-changed=build.rs");

    Ok(())
}
